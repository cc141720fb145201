pub mod api_client;
pub mod api_utils;
pub mod error_banner;
pub mod icons;
pub mod modal_frame;
pub mod modal_stack;
