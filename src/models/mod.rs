pub mod booking;
pub mod service;
pub mod slot;

pub use booking::{
    BookedBy, Booking, BookingRequest, PaymentMethod, PaymentStatus, Provider, RefundStatus,
};
pub use service::{Bedrooms, CleaningArea, HomeStyle, RepairItem, ServiceKind};
pub use slot::{SlotStatus, SlotView, TimeLabel};
