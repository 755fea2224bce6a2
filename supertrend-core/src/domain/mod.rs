//! Domain types: bars, windows, positions and broker payloads.

pub mod bar;
pub mod order;
pub mod position;
pub mod window;

pub use bar::{Bar, PriceSource};
pub use order::{
    CloseAllOrder, EntryOrder, OrderAction, OrderDetails, OrderHeader, PriceUpdateOrder,
    StopType, BROKER_ATR_FACTOR,
};
pub use position::{Position, PositionSide};
pub use window::{BarBuffer, BarWindow};
