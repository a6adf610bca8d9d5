pub mod email;
pub mod invoice_status;
pub mod organization_id;
pub mod organization_role;
pub mod password;
pub mod slug;
pub mod user_id;

pub use email::Email;
pub use invoice_status::InvoiceStatus;
pub use organization_id::OrganizationId;
pub use organization_role::OrganizationRole;
pub use password::{HashedPassword, Password};
pub use slug::Slug;
pub use user_id::UserId;
