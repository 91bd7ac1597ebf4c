pub mod crm;
pub mod dealflow_config;
pub mod errors;
pub mod logging;
