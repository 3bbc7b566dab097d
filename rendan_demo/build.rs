// build.rs
// Compile the demo GLSL shaders to SPIR-V next to their sources
// (shaders/mesh.vert -> shaders/mesh.vert.spv)

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHADER_EXTENSIONS: [&str; 2] = ["vert", "frag"];

fn main() {
    println!("cargo:rerun-if-changed=shaders");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");
    println!("cargo:rerun-if-env-changed=SKIP_SHADERS");

    if env::var("SKIP_SHADERS").is_ok() {
        println!("cargo:warning=Skipping shader compilation (SKIP_SHADERS set)");
        return;
    }

    let glslc = find_glslc();
    let shader_dir = PathBuf::from("shaders");
    let entries = match std::fs::read_dir(&shader_dir) {
        Ok(entries) => entries,
        Err(_) => {
            println!("cargo:warning=No shader directory found at {:?}", shader_dir);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_source = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SHADER_EXTENSIONS.contains(&ext));
        if !is_source {
            continue;
        }

        let mut output = path.clone().into_os_string();
        output.push(".spv");
        let output = PathBuf::from(output);

        if is_up_to_date(&path, &output) {
            continue;
        }

        match Command::new(&glslc).arg(&path).arg("-o").arg(&output).status() {
            Ok(status) if status.success() => {}
            Ok(status) => panic!("glslc failed on {:?} ({})", path, status),
            Err(e) => {
                // No compiler installed: keep any previously compiled binaries
                println!("cargo:warning=glslc unavailable ({}), {:?} not compiled", e, path);
                return;
            }
        }
    }
}

fn find_glslc() -> PathBuf {
    if let Ok(sdk) = env::var("VULKAN_SDK") {
        let bin = if cfg!(target_os = "windows") { "Bin/glslc.exe" } else { "bin/glslc" };
        let candidate = Path::new(&sdk).join(bin);
        if candidate.exists() {
            return candidate;
        }
    }
    PathBuf::from("glslc")
}

fn is_up_to_date(source: &Path, output: &Path) -> bool {
    let modified = |p: &Path| std::fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(source), modified(output)) {
        (Some(src), Some(dst)) => dst >= src,
        _ => false,
    }
}
