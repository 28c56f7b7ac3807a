pub mod compress;
pub mod download;
pub mod generate;
pub mod recognize;
pub mod remove_bg;
pub mod upload;
pub mod web;

pub use compress::{handle_compress, CompressForm, __path_handle_compress};
pub use generate::{
    handle_clear_history, handle_download, handle_generate, handle_history, ClearHistoryResponse,
    GenerateRequest, GenerateResponse,
};
pub use generate::{
    __path_handle_clear_history, __path_handle_download, __path_handle_generate,
    __path_handle_history,
};
pub use recognize::{handle_recognize, RecognizeForm, RecognizeResponse, __path_handle_recognize};
pub use remove_bg::{handle_remove_bg, RemoveBgForm, __path_handle_remove_bg};
pub use web::handle_index;
