pub mod build;
pub mod deploy;
pub mod publish;
