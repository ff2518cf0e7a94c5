pub mod order;
pub mod payload;
pub mod stage;

pub use order::{Customer, CustomerView, HistoryView, Item, ItemView, Order, OrderView, StatusHistory};
pub use payload::{OrderPayload, PayloadError, PayloadValidator};
pub use stage::Stage;
