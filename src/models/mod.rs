pub mod order;
pub mod order_status;

pub use order::{NewOrder, Order, OrderItem, OrderStatus, UpdateOrderStatusRequest};
pub use order_status::{OrderStatusResponse, ResolvedStatus};
