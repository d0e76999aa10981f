#[macro_use]
extern crate log;

use std::path::PathBuf;

use argh::FromArgs;
use cifs_client::{CifsClient, FileInfo, SmbOptions, TargetType, Url};

#[derive(FromArgs)]
#[argh(description = "
where positional can be: [smb://[user[:password]@]address[:port]/share/path/]

Lists the hosts of the default workgroup when no url is given.")]
struct Args {
    #[argh(option, short = 'u', description = "specify username")]
    username: Option<String>,
    #[argh(switch, short = 'P', description = "prompt for password")]
    password: bool,
    #[argh(option, description = "copy this remote file name to the current directory")]
    get: Option<String>,
    #[argh(option, description = "copy this local file to the listed directory")]
    put: Option<PathBuf>,
    #[argh(positional, description = "smb url of a server, share or directory")]
    url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::builder().try_init()?;
    let args: Args = argh::from_env();
    let client = CifsClient::libsmbclient(SmbOptions::default().case_sensitive(false));

    let Some(url) = args.url.as_deref() else {
        info!("listing hosts...");
        for host in client.get_hosts()? {
            println!("{}", host);
        }
        return Ok(());
    };

    let url = init_url(url, &args)?;
    if let Some(src) = &args.put {
        let name = src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow::anyhow!("{} has no file name", src.display()))?;
        let dest = url.join(&name)?;
        info!("uploading {} to {}", src.display(), dest);
        client.copy_to_server(src, &dest)?;
    }

    info!("listing files at {}", url);
    let mut files = client.get_file_info_list(&url, TargetType::FileOrDirectory)?;
    sort_files(&mut files);
    for file in &files {
        if file.is_directory() {
            println!("{}/", file.name());
        } else {
            println!("{}", file.name());
        }
    }

    if let Some(name) = &args.get {
        let file = files
            .iter()
            .find(|f| f.is_file() && f.name() == name)
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", name))?;
        info!("downloading {}", file.url());
        client.copy_from_server(file.url(), &PathBuf::from(file.name()))?;
    }

    Ok(())
}

/// Parse the url, filling in credentials given as options and making it a directory url
fn init_url(url: &str, args: &Args) -> anyhow::Result<Url> {
    let mut url = Url::parse(url)?;
    if let Some(username) = &args.username {
        url.set_username(username)
            .map_err(|_| anyhow::anyhow!("cannot set username on {}", url))?;
    }
    if args.password {
        let password = read_secret_from_tty("Password: ")?;
        url.set_password(Some(&password))
            .map_err(|_| anyhow::anyhow!("cannot set password on {}", url))?;
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Directories first, then by name
fn sort_files(files: &mut [FileInfo]) {
    files.sort_by(|a, b| {
        b.is_directory()
            .cmp(&a.is_directory())
            .then_with(|| a.name().cmp(b.name()))
    });
}

/// Read a secret from tty with customisable prompt
fn read_secret_from_tty(prompt: &str) -> std::io::Result<String> {
    rpassword::prompt_password(prompt)
}
