use clap::{crate_version, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use shardfec::config::CodeConfig;
use shardfec::{FecCode, FecError, Share, ShareCollector};

/// On-disk form of one share: the share plus what is needed to decode it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ShareFile {
    required: usize,
    total: usize,
    /// Length of the input before padding to a multiple of `required`.
    length: u64,
    number: u16,
    #[serde(with = "serde_bytes")]
    data: Vec<u8>,
}

impl From<ShareFile> for Share {
    fn from(file: ShareFile) -> Self {
        Share::new(file.number, file.data)
    }
}

#[derive(Debug, Subcommand)]
enum CliArgument {
    /// Write a config file holding the default code parameters.
    Init {
        /// Overwrite an existing config file.
        #[clap(long, short)]
        force: bool,
    },
    /// Encode a file into `total` share files.
    Encode {
        /// File to encode.
        #[clap(long, short)]
        input: PathBuf,

        /// Directory receiving `share-NNN.cbor` files.
        #[clap(long, short)]
        out_dir: PathBuf,

        /// Overrides `required` from the config.
        #[clap(long, short)]
        required: Option<usize>,

        /// Overrides `total` from the config.
        #[clap(long, short)]
        total: Option<usize>,
    },
    /// Decode share files back into the original file, correcting corrupted shares.
    Decode {
        /// Where to write the decoded file.
        #[clap(long, short)]
        output: PathBuf,

        /// Share files to decode from.
        #[clap(required = true)]
        shares: Vec<PathBuf>,
    },
    /// Print the metadata of share files as JSON.
    Inspect {
        #[clap(required = true)]
        shares: Vec<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "shardfec")]
#[command(version = crate_version!())]
#[command(
    about = "Reed-Solomon erasure coding with error correction",
    long_about = "shardfec splits a file into `required` data shares plus `total - required` parity shares. Any `required` shares rebuild the file, and every additional share lets the decoder correct one corrupted share out of every two. Code parameters come from the config file, then SHARDFEC_REQUIRED / SHARDFEC_TOTAL, then the command line."
)]
struct Opt {
    /// Config file with `required` and `total`.
    #[clap(long, short, default_value = "conf.toml")]
    config: PathBuf,

    /// Subcommand to run.
    #[clap(subcommand)]
    argument: CliArgument,
}

fn read_share_files(paths: &[PathBuf]) -> Result<Vec<ShareFile>, Box<dyn Error>> {
    paths
        .iter()
        .map(|path| -> Result<ShareFile, Box<dyn Error>> {
            let bytes = fs::read(path)?;
            let file: ShareFile = serde_cbor::from_slice(&bytes)
                .map_err(|err| format!("{}: {err}", path.display()))?;
            Ok(file)
        })
        .collect()
}

/// Zero-pads `input` to a non-empty multiple of `required` and encodes it
/// into one [`ShareFile`] per share.
fn encode_files(code: &FecCode, input: &[u8]) -> Result<Vec<ShareFile>, FecError> {
    let k = code.required();
    let mut data = input.to_vec();
    data.resize(input.len().div_ceil(k).max(1) * k, 0);

    let mut collector = ShareCollector::new();
    code.encode(&data, &mut collector)?;

    Ok(collector
        .into_shares()
        .into_iter()
        .map(|share| ShareFile {
            required: k,
            total: code.total(),
            length: input.len() as u64,
            number: share.number,
            data: share.data,
        })
        .collect())
}

/// Decodes share files from one encoding, correcting corrupted shares, and
/// strips the padding added by [`encode_files`].
fn decode_files(files: Vec<ShareFile>) -> Result<Vec<u8>, Box<dyn Error>> {
    let first = files.first().ok_or("no share files given")?;
    let (required, total, length) = (first.required, first.total, first.length);

    if files
        .iter()
        .any(|f| f.required != required || f.total != total || f.length != length)
    {
        return Err("share files come from different encodings".into());
    }

    let code = FecCode::new(required, total)?;
    let shares: Vec<Share> = files.into_iter().map(Share::from).collect();

    let mut collector = ShareCollector::new();
    code.decode(&shares, Some(&mut collector))?;

    let mut data = collector.concat();
    if (data.len() as u64) < length {
        return Err(format!("shares hold {} bytes, expected {length}", data.len()).into());
    }
    data.truncate(length as usize);
    Ok(data)
}

fn encode(code: &FecCode, input: &Path, out_dir: &Path) -> Result<(), Box<dyn Error>> {
    let data = fs::read(input)?;
    let files = encode_files(code, &data)?;

    fs::create_dir_all(out_dir)?;
    for file in &files {
        let path = out_dir.join(format!("share-{:03}.cbor", file.number));
        fs::write(&path, serde_cbor::to_vec(file)?)?;
        debug!("wrote {}", path.display());
    }

    println!(
        "✂️ Encoded {} bytes into {} shares ({} required) in {}",
        data.len(),
        code.total(),
        code.required(),
        out_dir.display()
    );
    Ok(())
}

fn decode(output: &Path, paths: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let files = read_share_files(paths)?;
    let count = files.len();
    let data = decode_files(files)?;
    fs::write(output, &data)?;

    println!(
        "🧩 Decoded {} bytes from {} shares into {}",
        data.len(),
        count,
        output.display()
    );
    Ok(())
}

fn inspect(paths: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    for (path, file) in paths.iter().zip(read_share_files(paths)?) {
        let digest_len = file.data.len().min(8);
        let summary = serde_json::json!({
            "file": path.display().to_string(),
            "number": file.number,
            "required": file.required,
            "total": file.total,
            "length": file.length,
            "share_len": file.data.len(),
            "head": hex::encode(&file.data[..digest_len]),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let opt = Opt::parse();

    match opt.argument {
        CliArgument::Init { force } => {
            if opt.config.exists() && !force {
                return Err(format!("{} already exists", opt.config.display()).into());
            }
            fs::write(&opt.config, CodeConfig::default().to_toml()?)?;
            println!("📝 Wrote default config to {}", opt.config.display());
        }
        CliArgument::Encode {
            input,
            out_dir,
            required,
            total,
        } => {
            let mut config = CodeConfig::load(Some(opt.config.as_path()))?;
            if let Some(required) = required {
                config.required = required;
            }
            if let Some(total) = total {
                config.total = total;
            }
            debug!("using {:?}", config);
            encode(&config.build()?, &input, &out_dir)?;
        }
        CliArgument::Decode { output, shares } => decode(&output, &shares)?,
        CliArgument::Inspect { shares } => inspect(&shares)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn through_cbor(files: &[ShareFile]) -> Vec<ShareFile> {
        files
            .iter()
            .map(|f| serde_cbor::from_slice(&serde_cbor::to_vec(f).unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn test_uneven_length_is_padded_and_truncated() {
        let code = FecCode::new(3, 7).unwrap();
        let input = b"ten bytes!".to_vec();

        let files = encode_files(&code, &input).unwrap();
        assert_eq!(files.len(), 7);
        assert!(files.iter().all(|f| f.data.len() == 4 && f.length == 10));

        assert_eq!(decode_files(through_cbor(&files)).unwrap(), input);
    }

    #[test]
    fn test_empty_input() {
        let code = FecCode::new(4, 6).unwrap();
        let files = encode_files(&code, &[]).unwrap();
        assert!(files.iter().all(|f| f.data.len() == 1 && f.length == 0));

        assert!(decode_files(files).unwrap().is_empty());
    }

    #[test]
    fn test_corrupted_share_is_corrected() {
        let code = FecCode::new(4, 10).unwrap();
        let input: Vec<u8> = (0..1001u32).map(|i| (i * 7) as u8).collect();

        let mut files = encode_files(&code, &input).unwrap();
        files[2].data[100] ^= 0x5a;
        files[6].data[0] ^= 0x01;
        files.remove(9);

        assert_eq!(decode_files(through_cbor(&files)).unwrap(), input);
    }

    #[test]
    fn test_share_file_size_tracks_payload() {
        let code = FecCode::new(4, 10).unwrap();
        let files = encode_files(&code, &[0xee; 1001]).unwrap();
        for file in &files {
            let bytes = serde_cbor::to_vec(file).unwrap();
            assert!(bytes.len() < file.data.len() + 64, "{} bytes", bytes.len());
        }
    }

    #[test]
    fn test_mixed_encodings_are_rejected() {
        let a = encode_files(&FecCode::new(3, 7).unwrap(), b"abcdef").unwrap();
        let b = encode_files(&FecCode::new(3, 7).unwrap(), b"abcdefgh").unwrap();

        let mixed = vec![a[0].clone(), a[1].clone(), b[2].clone()];
        assert!(decode_files(mixed).is_err());
        assert!(decode_files(Vec::new()).is_err());
    }
}
