pub mod attachments;
pub mod clients;
pub mod invoices;
pub mod organizations;
pub mod projects;
pub mod sessions;
pub mod tasks;
pub mod users;
