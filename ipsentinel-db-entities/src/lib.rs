#![allow(non_snake_case)]

pub mod AccessLog;
pub mod IpRecord;
pub mod User;
