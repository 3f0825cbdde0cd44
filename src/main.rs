use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use clap::{Parser, ValueEnum};
use dns_proto::{build_response, Reply, ResponseCode};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

// answer intercepted queries without resolving them

#[derive(Clone, Copy, ValueEnum)]
enum Rcode {
    Noerror,
    Formerr,
    Servfail,
    Nxdomain,
    Notimp,
    Refused,
}

impl From<Rcode> for ResponseCode {
    fn from(code: Rcode) -> Self {
        match code {
            Rcode::Noerror => ResponseCode::NoError,
            Rcode::Formerr => ResponseCode::FormErr,
            Rcode::Servfail => ResponseCode::ServFail,
            Rcode::Nxdomain => ResponseCode::NxDomain,
            Rcode::Notimp => ResponseCode::NotImp,
            Rcode::Refused => ResponseCode::Refused,
        }
    }
}

#[derive(Parser)]
#[command(name = "dns_sinkhole")]
#[command(about = "Answers DNS queries on a UDP socket with a fixed reply")]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:1053")]
    bind: SocketAddr,

    /// Response code for every query
    #[arg(short, long, value_enum, default_value = "nxdomain")]
    rcode: Rcode,

    /// Answer with this A record instead of an error code
    #[arg(short, long)]
    address: Option<Ipv4Addr>,

    /// TTL of the A record, in seconds
    #[arg(long, default_value_t = 60)]
    ttl: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn reply(&self) -> Reply {
        match self.address {
            Some(address) => Reply::Address {
                address,
                ttl: self.ttl,
            },
            None => Reply::Code(self.rcode.into()),
        }
    }
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// largest UDP payload, so EDNS queries are never cut short
const MAX_DATAGRAM_LEN: usize = 65535;

fn handle_query(socket: &UdpSocket, reply: &Reply, data: &mut [u8]) {
    let (n, src) = match socket.recv_from(data) {
        Ok(received) => received,
        Err(e) => {
            error!(error = %e, "receive failed");
            return;
        }
    };

    match build_response(&data[..n], reply) {
        Ok(resp_buf) => match socket.send_to(&resp_buf, src) {
            Ok(_) => debug!(%src, len = resp_buf.len(), "answered"),
            Err(e) => error!(%src, error = %e, "send failed"),
        },
        Err(e) => debug!(%src, error = %e, "dropping packet"),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let reply = cli.reply();
    let socket = UdpSocket::bind(cli.bind)?;
    info!(bind = %cli.bind, ?reply, "listening");

    let mut data = vec![0u8; MAX_DATAGRAM_LEN];
    loop {
        handle_query(&socket, &reply, &mut data);
    }
}
