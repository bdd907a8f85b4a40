pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod deals;
pub mod enrollments;
pub mod faqs;
pub mod module_progress;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod support_categories;
pub mod support_tickets;
pub mod ticket_messages;
pub mod training_categories;
pub mod training_courses;
pub mod training_modules;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use deals::Entity as Deals;
pub use enrollments::Entity as Enrollments;
pub use faqs::Entity as Faqs;
pub use module_progress::Entity as ModuleProgress;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payments::Entity as Payments;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use support_categories::Entity as SupportCategories;
pub use support_tickets::Entity as SupportTickets;
pub use ticket_messages::Entity as TicketMessages;
pub use training_categories::Entity as TrainingCategories;
pub use training_courses::Entity as TrainingCourses;
pub use training_modules::Entity as TrainingModules;
pub use users::Entity as Users;
