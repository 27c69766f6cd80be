pub mod text_file;
