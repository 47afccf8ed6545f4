#[cfg(target_os = "windows")]
fn main() {
    use winresource::WindowsResource;

    let mut res = WindowsResource::new();
    if std::path::Path::new("res/rworktime.ico").exists() {
        res.set_icon("res/rworktime.ico");
    }
    res.set("FileDescription", "rWorktime CLI")
        .set("ProductName", "rWorktime")
        .set("OriginalFilename", "rworktime.exe")
        .set("FileVersion", env!("CARGO_PKG_VERSION"))
        .set("ProductVersion", env!("CARGO_PKG_VERSION"));

    if let Err(e) = res.compile() {
        println!("cargo:warning=failed to embed Windows resources: {}", e);
    }
}

#[cfg(not(target_os = "windows"))]
fn main() {}
