use clap::{Arg, ArgGroup, ArgMatches, Command};
use microvault_types::{
    Address, DeployConfig, CLI_NETWORK, LABORATORY_URL, STELLAR_CLI_RELEASES_URL,
};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "contract-config.json";
const WASM_TARGET: &str = "wasm32-unknown-unknown";

#[derive(Debug, Error)]
enum CliError {
    #[error("stellar CLI not found on PATH; install it from {STELLAR_CLI_RELEASES_URL}")]
    MissingStellarCli,
    #[error("no Cargo.toml in {0:?}; not a contract directory")]
    ConfigMissing(PathBuf),
    #[error("expected contract artifact at {0:?}; did the build target change?")]
    ArtifactMissing(PathBuf),
    #[error("no signing key: pass --source-account or run --deploy first to write {CONFIG_FILE}")]
    MissingCredential,
    #[error("no contract id found in deploy output (the tool's format may have changed): {0:?}")]
    OutputFormatChanged(String),
    #[error("{program} exited with {status}: {output}")]
    Command {
        program: String,
        status: String,
        output: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file error: {0}")]
    Config(#[from] serde_json::Error),
}

fn command() -> Command {
    Command::new("microvault")
        .about("Operator tooling for the micro-insurance contract on testnet")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("info")
                .long("info")
                .value_name("ADDRESS")
                .num_args(1)
                .help("Show ledger account info for an address"),
        )
        .arg(
            Arg::new("fund")
                .long("fund")
                .value_name("ADDRESS")
                .num_args(1)
                .help("Fund a testnet account via the faucet"),
        )
        .arg(
            Arg::new("build")
                .long("build")
                .value_name("CONTRACT_PATH")
                .num_args(1)
                .help("Build the contract in the given directory to wasm"),
        )
        .arg(
            Arg::new("deploy")
                .long("deploy")
                .value_names(["CONTRACT_PATH", "PUBLIC_KEY"])
                .num_args(2)
                .help("Build and deploy the contract, then persist its id"),
        )
        .arg(
            Arg::new("invoke")
                .long("invoke")
                .value_names(["CONTRACT_ID", "FUNCTION", "ARGS"])
                .num_args(2..)
                .help("Invoke a contract function with positional args"),
        )
        .arg(
            Arg::new("source-account")
                .long("source-account")
                .value_name("KEY")
                .num_args(1)
                .help("Signing key for --invoke, overriding the persisted config"),
        )
        .group(ArgGroup::new("operation").args(["info", "fund", "build", "deploy", "invoke"]))
}

/// Run an external tool to completion, returning its combined output.
/// The exact command line is logged before the child starts.
async fn run_command(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> Result<String, CliError> {
    log::info!("running: {} {}", program, args.join(" "));
    let mut command = tokio::process::Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let output = command.output().await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = format!("{stdout}{stderr}");
    if !output.status.success() {
        return Err(CliError::Command {
            program: program.to_string(),
            status: output.status.to_string(),
            output: combined,
        });
    }
    Ok(combined)
}

/// Every operation starts here: the external CLI must exist, and the
/// network gets pinned so later commands cannot hit the wrong one.
async fn preflight() -> Result<(), CliError> {
    run_command("stellar", &["version"], None)
        .await
        .map_err(|_| CliError::MissingStellarCli)?;
    run_command("stellar", &["network", "use", CLI_NETWORK], None).await?;
    Ok(())
}

async fn account_info(address: &str) -> Result<String, CliError> {
    run_command("stellar", &["account", "info", address], None).await
}

/// Faucet funding is best-effort: any failure downgrades to a warning with
/// the manual funding page.
async fn fund(address: &str) {
    let funded = match address.parse::<Address>() {
        Ok(addr) => microvault_horizon::fund_account(&addr)
            .await
            .map(|body| log::debug!("faucet response: {body}"))
            .map_err(|err| err.to_string()),
        Err(err) => Err(err.to_string()),
    };
    match funded {
        Ok(()) => println!("funded {address}"),
        Err(reason) => {
            println!("warning: faucet funding failed: {reason}");
            println!("fund the account manually at {LABORATORY_URL}");
        }
    }
}

async fn build_contract(contract_path: &Path) -> Result<PathBuf, CliError> {
    let manifest = contract_path.join("Cargo.toml");
    if !manifest.exists() {
        return Err(CliError::ConfigMissing(contract_path.to_path_buf()));
    }
    run_command(
        "cargo",
        &["build", "--target", WASM_TARGET, "--release"],
        Some(contract_path),
    )
    .await?;
    let name = contract_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("contract");
    let wasm = contract_path
        .join("target")
        .join(WASM_TARGET)
        .join("release")
        .join(format!("{name}.wasm"));
    if !wasm.exists() {
        return Err(CliError::ArtifactMissing(wasm));
    }
    Ok(wasm)
}

/// Known deploy output shapes, newest first. Anything else is an error so
/// a tool upgrade cannot silently persist garbage.
fn parse_deploy_output(output: &str) -> Result<String, CliError> {
    if let Some(rest) = output.split("Contract ID:").nth(1) {
        if let Some(token) = rest.split_whitespace().next() {
            return Ok(token.to_string());
        }
    }
    // older releases print the bare id as the final line
    if let Some(line) = output.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
        if line.len() == 56
            && line.starts_with('C')
            && line
                .chars()
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        {
            return Ok(line.to_string());
        }
    }
    Err(CliError::OutputFormatChanged(output.trim().to_string()))
}

fn write_config(path: &Path, config: &DeployConfig) -> Result<(), CliError> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    let json = serde_json::to_string_pretty(config)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn read_config(dir: &Path) -> Result<DeployConfig, CliError> {
    let contents = std::fs::read_to_string(dir.join(CONFIG_FILE))?;
    Ok(serde_json::from_str(&contents)?)
}

async fn deploy_contract(contract_path: &Path, public_key: &str) -> Result<DeployConfig, CliError> {
    let wasm = build_contract(contract_path).await?;
    let wasm_arg = wasm.to_string_lossy().to_string();
    let output = run_command(
        "soroban",
        &[
            "contract",
            "deploy",
            "--wasm",
            &wasm_arg,
            "--source-account",
            public_key,
            "--network",
            CLI_NETWORK,
        ],
        None,
    )
    .await?;

    let contract_id = parse_deploy_output(&output)?;
    let config = DeployConfig::testnet(contract_id, public_key);
    let config_path = contract_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .join(CONFIG_FILE);
    write_config(&config_path, &config)?;
    println!("contract id: {}", config.contract_id);
    println!("config written to {config_path:?}");
    Ok(config)
}

/// The acting key for an invocation: the explicit flag wins, then the
/// persisted deploy config in the working directory.
fn resolve_invoke_key(explicit: Option<&str>, cwd: &Path) -> Result<String, CliError> {
    if let Some(key) = explicit {
        if !key.trim().is_empty() {
            return Ok(key.to_string());
        }
    }
    match read_config(cwd) {
        Ok(config) if !config.public_key.trim().is_empty() => Ok(config.public_key),
        Ok(_) => Err(CliError::MissingCredential),
        Err(err) => {
            log::debug!("no usable {CONFIG_FILE} in {cwd:?}: {err}");
            Err(CliError::MissingCredential)
        }
    }
}

fn invoke_args(
    contract_id: &str,
    function: &str,
    args: &[String],
    source_account: &str,
) -> Vec<String> {
    let mut argv = vec![
        "contract".to_string(),
        "invoke".to_string(),
        "--id".to_string(),
        contract_id.to_string(),
        "--source-account".to_string(),
        source_account.to_string(),
        "--network".to_string(),
        CLI_NETWORK.to_string(),
        "--function".to_string(),
        function.to_string(),
    ];
    for arg in args {
        argv.push("--arg".to_string());
        argv.push(arg.clone());
    }
    argv
}

async fn invoke_contract(
    contract_id: &str,
    function: &str,
    args: &[String],
    explicit_key: Option<&str>,
) -> Result<String, CliError> {
    let cwd = std::env::current_dir()?;
    let key = resolve_invoke_key(explicit_key, &cwd)?;
    let argv = invoke_args(contract_id, function, args, &key);
    let refs: Vec<&str> = argv.iter().map(String::as_str).collect();
    run_command("soroban", &refs, None).await
}

async fn run(matches: &ArgMatches) -> Result<(), CliError> {
    if let Some(address) = matches.get_one::<String>("info") {
        preflight().await?;
        let output = account_info(address).await?;
        println!("{output}");
    } else if let Some(address) = matches.get_one::<String>("fund") {
        preflight().await?;
        fund(address).await;
    } else if let Some(path) = matches.get_one::<String>("build") {
        preflight().await?;
        let wasm = build_contract(Path::new(path)).await?;
        println!("built {wasm:?}");
    } else if let Some(values) = matches.get_many::<String>("deploy") {
        let values: Vec<&String> = values.collect();
        preflight().await?;
        deploy_contract(Path::new(values[0].as_str()), values[1]).await?;
    } else if let Some(values) = matches.get_many::<String>("invoke") {
        let values: Vec<&String> = values.collect();
        preflight().await?;
        let positional: Vec<String> = values[2..].iter().map(|v| v.to_string()).collect();
        let explicit = matches
            .get_one::<String>("source-account")
            .map(String::as_str);
        let output = invoke_contract(values[0], values[1], &positional, explicit).await?;
        println!("{output}");
    } else {
        command().print_help()?;
        println!();
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    if let Err(err) = simple_logger::init_with_level(log::Level::Info) {
        eprintln!("logger init failed: {err}");
    }

    let matches = command().get_matches();
    if let Err(err) = run(&matches).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID: &str = "CBMT5ZHB7D34ATEG5Q3NETD6OOLAU2MOL6YYFUUGY2PVQAGWBJTJTAAQ";

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("microvault-cli-{name}-{}", std::process::id()));
        if dir.exists() {
            std::fs::remove_dir_all(&dir).unwrap();
        }
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn surface_parses_each_operation() {
        assert!(command()
            .try_get_matches_from(["microvault", "--info", "GABC"])
            .is_ok());
        assert!(command()
            .try_get_matches_from(["microvault", "--deploy", "./contract", "GXYZ"])
            .is_ok());
        assert!(command()
            .try_get_matches_from([
                "microvault",
                "--invoke",
                "CID123",
                "buy_insurance",
                "buyer=GABC",
                "amount=1000",
            ])
            .is_ok());
        assert!(command()
            .try_get_matches_from(["microvault", "--deploy", "only-one-value"])
            .is_err());
        assert!(command()
            .try_get_matches_from(["microvault", "--no-such-flag"])
            .is_err());
        // bare invocation parses; main answers it with usage and exit 0
        let matches = command().try_get_matches_from(["microvault"]).unwrap();
        assert!(!matches.contains_id("operation"));
    }

    #[test]
    fn deploy_output_parser_handles_known_formats() {
        let labelled = "Uploading wasm...\nContract ID: CID123\nDone.";
        assert_eq!(parse_deploy_output(labelled).unwrap(), "CID123");

        let bare = format!("some progress noise\n{CID}\n");
        assert_eq!(parse_deploy_output(&bare).unwrap(), CID);

        let err = parse_deploy_output("deployed OK, see dashboard").unwrap_err();
        assert!(matches!(err, CliError::OutputFormatChanged(_)));
    }

    #[test]
    fn invoke_command_line_is_ordered() {
        let args = vec!["buyer=GABC".to_string(), "amount=1000".to_string()];
        let argv = invoke_args("CID123", "buy_insurance", &args, "GXYZ");
        assert_eq!(
            argv,
            vec![
                "contract",
                "invoke",
                "--id",
                "CID123",
                "--source-account",
                "GXYZ",
                "--network",
                "test-sdf",
                "--function",
                "buy_insurance",
                "--arg",
                "buyer=GABC",
                "--arg",
                "amount=1000",
            ]
        );
    }

    #[test]
    fn invoke_key_prefers_explicit_then_config() {
        let dir = temp_dir("keys");
        write_config(
            &dir.join(CONFIG_FILE),
            &DeployConfig::testnet("CID123", "GXYZ"),
        )
        .unwrap();

        assert_eq!(
            resolve_invoke_key(Some("GOTHER"), &dir).unwrap(),
            "GOTHER"
        );
        assert_eq!(resolve_invoke_key(None, &dir).unwrap(), "GXYZ");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_key_and_config_is_a_credential_error() {
        let dir = temp_dir("nokey");
        let err = resolve_invoke_key(None, &dir).unwrap_err();
        assert!(matches!(err, CliError::MissingCredential));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn config_round_trips_through_the_file() {
        let dir = temp_dir("config");
        let config = DeployConfig::testnet(CID, "GXYZ");
        write_config(&dir.join(CONFIG_FILE), &config).unwrap();

        let contents = std::fs::read_to_string(dir.join(CONFIG_FILE)).unwrap();
        assert!(contents.contains("\"contractId\""));
        assert!(contents.contains("\"publicKey\""));
        assert!(contents.contains("\"network\": \"testnet\""));

        let back = read_config(&dir).unwrap();
        assert_eq!(back, config);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_manifest_stops_before_any_build() {
        let dir = temp_dir("nomanifest");
        let err = build_contract(&dir).await.unwrap_err();
        assert!(matches!(err, CliError::ConfigMissing(_)));
        let err = deploy_contract(&dir, "GXYZ").await.unwrap_err();
        assert!(matches!(err, CliError::ConfigMissing(_)));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
