use tokio::process::{Child, Command};

/// Command running `script` through the platform shell (`sh -c` / `cmd /C`).
pub fn shell_command(script: &str) -> Command {
    cfg_if::cfg_if! {
        if #[cfg(target_family = "windows")] {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(script);
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(script);
        }
    }
    cmd
}

pub async fn kill(child: &mut Child) -> std::io::Result<()> {
    child.kill().await
}
