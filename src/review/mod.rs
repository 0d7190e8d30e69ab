pub mod controller;
pub mod judge;
pub mod verdict;
