pub mod drive;

pub use drive::{
    confirm_token, extract_file_id, file_name_from_headers, DriveDownloader, CHUNK_SIZE,
    CONFIRM_TOKEN_PREFIX, DEFAULT_FILE_NAME,
};
