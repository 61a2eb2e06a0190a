use std::io::Result;

fn main() -> Result<()> {
    println!("build proto");
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(path) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", path);
        }
    }
    prost_build::Config::new()
        .bytes(["."])
        .compile_protos(&["src/pb/rangekvpb.proto"], &["src/pb/"])?;
    Ok(())
}
