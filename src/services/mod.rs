pub mod auth_service;
pub mod dispatch_service;
pub mod quota_service;
pub mod report_service;
pub mod retention_service;
pub mod scheduler;
pub mod template_service;
pub mod upload_service;
pub mod webhook_service;
