pub mod graphs;
pub mod health;
