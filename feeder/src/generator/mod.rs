pub mod scatter;
