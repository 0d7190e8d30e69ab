pub mod context;
pub mod load;
pub mod locale;
pub mod model;
