pub mod ms {
    pub const CAPTURE: u64 = 3000;
    pub const PAGE_LOAD_SETTLE: u64 = 300;
}

pub mod secs {
    pub const TARGET_OPEN: u64 = 30;
    pub const REQUEST: u64 = 60;
    pub const BROWSER_CLOSE: u64 = 5;
}
