pub mod channels;
pub mod payments;
pub mod refunds;

// Re-export commonly used types
pub use channels::ChannelService;
pub use payments::PaymentService;
pub use refunds::RefundService;
