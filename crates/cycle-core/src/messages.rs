//! User-facing notices and errors reported by the admin operations.

pub const CREATE_NOTICE: &str = "Your order cycle has been created.";
pub const UPDATE_NOTICE: &str = "Your order cycle has been updated.";
pub const EMAIL_TO_PRODUCERS_NOTICE: &str =
    "Emails to be sent to producers have been queued for sending.";

pub const NO_PERMISSION_TO_COORDINATE: &str =
    "None of your enterprises have permission to coordinate an order cycle";
pub const NO_PERMISSION_TO_CREATE: &str =
    "You don't have permission to create an order cycle coordinated by that enterprise";

pub const DESTROY_SCHEDULE_PRESENT: &str = "That order cycle is linked to a schedule and cannot be deleted. Please unlink or delete the schedule first.";
pub const DESTROY_ORDERS_PRESENT: &str = "That order cycle has been selected by a customer and cannot be deleted. To prevent customers from accessing it, please close it instead.";
pub const DESTROY_NOTICE: &str = "Order cycle has been successfully removed";

pub const BULK_UPDATE_NO_DATA: &str = "Hm, something went wrong. No order cycle data found.";

pub fn clone_notice(name: &str) -> String {
    format!("Your order cycle {name} has been cloned.")
}

pub fn cloned_name(name: &str) -> String {
    format!("COPY OF {name}")
}
