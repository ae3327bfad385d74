pub mod config;
pub mod logging;

pub mod check;
pub mod checksum;
pub mod filelist;
pub mod manifest;
pub mod model;
pub mod probe;
pub mod status;
pub mod worker;
