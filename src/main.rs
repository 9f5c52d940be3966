// src/main.rs
use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use ethers::types::Address;
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use swap_userop::addresses::SessionAuthority;
use swap_userop::rpc::{SwapRpcImpl, SwapRpcServer};
use swap_userop::session::SignatureLayout;
use swap_userop::{ChainClient, EthersChainClient, ProviderConfig, SmartAccountV1Provider};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutArg {
    OwnerOnly,
    OwnerSession,
    ServerOwnerSession,
}

impl From<LayoutArg> for SignatureLayout {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::OwnerOnly => SignatureLayout::OwnerOnly,
            LayoutArg::OwnerSession => SignatureLayout::OwnerSession,
            LayoutArg::ServerOwnerSession => SignatureLayout::ServerOwnerSession,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SimulationArg {
    Contract,
    Raw,
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long, env = "RPC_SERVER_ADDR", default_value = "127.0.0.1:8545")]
    rpc_server_addr: String,

    #[clap(short, long, env = "ETH_RPC_URL")]
    eth_rpc_url: String,

    #[clap(long, env = "ENTRY_POINT_ADDRESS")]
    entry_point: Option<Address>,

    #[clap(long, env = "FACTORY_ADDRESS")]
    factory: Option<Address>,

    #[clap(long, env = "SESSION_KEY_MANAGER_ADDRESS", conflicts_with = "authorizer")]
    session_key_manager: Option<Address>,

    #[clap(long, env = "AUTHORIZER_ADDRESS")]
    authorizer: Option<Address>,

    #[clap(long, env = "SIGNATURE_LAYOUT", value_enum, default_value = "owner-only")]
    signature_layout: LayoutArg,

    #[clap(long, env = "SIMULATION", value_enum, default_value = "contract")]
    simulation: SimulationArg,

    #[clap(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: Level,
}

impl Args {
    fn provider_config(&self) -> ProviderConfig {
        let session_authority = self
            .session_key_manager
            .map(SessionAuthority::SessionKeyManager)
            .or(self.authorizer.map(SessionAuthority::Authorizer));

        ProviderConfig {
            entry_point: self.entry_point,
            factory: self.factory,
            session_authority,
            dex: None,
            signature_layout: self.signature_layout.into(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Connect to the node and resolve the chain's contracts
    let client = EthersChainClient::connect(
        &args.eth_rpc_url,
        args.simulation == SimulationArg::Raw,
    )?;
    let provider = SmartAccountV1Provider::new(Arc::new(client), args.provider_config()).await?;

    // Create the JSON-RPC server
    let server_addr: SocketAddr = args.rpc_server_addr.parse()?;
    let swap_rpc = SwapRpcImpl::new(Arc::new(provider));

    info!("Starting swap request RPC server on {}", server_addr);

    let server_handle = start_server(server_addr, swap_rpc).await?;

    // Keep the server running until Ctrl+C is pressed
    tokio::signal::ctrl_c().await?;
    server_handle.stop()?;
    info!("Server stopped");

    Ok(())
}

async fn start_server<C: ChainClient>(
    server_addr: SocketAddr,
    swap_rpc: SwapRpcImpl<C>,
) -> anyhow::Result<ServerHandle> {
    let server = ServerBuilder::default().build(server_addr).await?;

    let server_handle = server.start(swap_rpc.into_rpc());

    Ok(server_handle)
}
