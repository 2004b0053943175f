pub mod db;
pub mod games;
