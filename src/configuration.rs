pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> u16;
    fn database_url(&self) -> Option<String>;
    /// How many days after today a ground can still be booked.
    fn booking_horizon_days(&self) -> u32;
}
