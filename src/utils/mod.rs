pub mod temp_dir;
