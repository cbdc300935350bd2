mod dispatch;

pub use dispatch::dispatch;
