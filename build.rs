use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// 收集 migrations/ 下的 .sql 文件（按文件名排序，跳过 000_ 开头的草稿文件）
fn collect_migrations(dir: &Path) -> Vec<PathBuf> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            name.ends_with(".sql") && !name.starts_with("000_")
        })
        .collect();
    files.sort();
    files
}

fn main() {
    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR 未设置");
    let dest_path = Path::new(&out_dir).join("migrations.rs");

    println!("cargo:rerun-if-changed=migrations");

    let files = collect_migrations(Path::new("migrations"));
    let entries: Vec<String> = files
        .iter()
        .map(|path| {
            println!("cargo:rerun-if-changed={}", path.display());
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let relative = path.display().to_string().replace('\\', "/");
            format!(
                "    (\"{stem}\", include_str!(concat!(env!(\"CARGO_MANIFEST_DIR\"), \"/{relative}\")))"
            )
        })
        .collect();

    let mut f = fs::File::create(&dest_path).expect("无法创建 migrations.rs");
    writeln!(
        f,
        "/// 编译期嵌入的数据库迁移（名称, SQL），按文件名顺序执行\n\
         pub const MIGRATIONS: &[(&str, &str)] = &[\n{}\n];",
        entries.join(",\n")
    )
    .expect("无法写入 migrations.rs");
}
