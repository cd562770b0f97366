pub mod classification_service;
pub mod report;
