//! Distributed driver for the second partial sieve function.
//!
//! Mirrors the teacher's `primes-mpi` binary: an MPI path behind the `mpi`
//! feature, a TCP master/worker fallback for hosts without an MPI
//! installation, and a single-process fallback that simulates every rank
//! in-process when neither is requested. Every path performs the same
//! static equal-shard partition of `[2, z)` and combines shard sums with no
//! cross-rank messaging during compute -- only the final reduction crosses
//! the wire.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use p2core::distributed::{combine_shards, p2_distributed_simulated, run_shard, ShardResult};
use p2core::intmath::isqrt;
use p2core::primes::SievedPrimeTable;
use p2core::StatusConfig;

/// Compute P2(x, y) across a distributed process group.
#[derive(Parser, Debug, Clone)]
#[command(name = "p2-dist")]
#[command(about = "Compute P2(x, y) across distributed ranks", long_about = None)]
struct Args {
    /// The upper bound x.
    #[arg(long)]
    x: i64,

    /// The partial sieve threshold y.
    #[arg(long)]
    y: i64,

    /// Worker threads per rank.
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Print round-by-round progress.
    #[arg(long, default_value_t = false)]
    status: bool,

    /// Output a single CSV line instead of the human-readable report.
    #[arg(long, default_value_t = false)]
    csv: bool,

    /// Simulate this many ranks in a single process (no MPI, no TCP).
    #[arg(long, default_value_t = 1)]
    ranks: usize,

    /// Use the TCP fallback instead of MPI or in-process simulation.
    #[arg(long, default_value_t = false)]
    tcp: bool,

    /// TCP master address (for TCP mode).
    #[arg(long, default_value = "127.0.0.1:7879")]
    master_addr: String,

    /// Number of TCP workers expected (for TCP master mode).
    #[arg(long, default_value_t = 2)]
    workers: usize,

    /// Run as a TCP worker, connecting to `master_addr`.
    #[arg(long, default_value_t = false)]
    worker: bool,
}

#[cfg(feature = "mpi")]
mod mpi_impl {
    use super::*;
    use mpi::collective::CommunicatorCollectives;
    use mpi::topology::Communicator;
    use mpi::traits::*;

    pub fn run_mpi(args: &Args) -> Result<Option<i64>> {
        let universe = mpi::initialize().context("failed to initialize MPI")?;
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;

        let status = args.status.then_some(StatusConfig { decimals: 1 });
        let sqrt_x = isqrt(args.x);
        let z = args.x / args.y.max(1);
        let table = SievedPrimeTable::new(sqrt_x.max(z).max(2) as u64)?;
        table.extend_to(z.max(2) as u64)?;

        let local = run_shard::<i64>(args.x, args.y, z, args.threads, rank, size, &table, status)?;

        let local_sum = local.shard_sum;
        let local_c = local.c_ab_term.unwrap_or(0);

        let mut sums = if rank == 0 { vec![0i64; size] } else { vec![] };
        let mut cs = if rank == 0 { vec![0i64; size] } else { vec![] };
        world.gather_into_root(&local_sum, &mut sums);
        world.gather_into_root(&local_c, &mut cs);

        if rank == 0 {
            let results: Vec<ShardResult<i64>> = sums
                .into_iter()
                .zip(cs)
                .enumerate()
                .map(|(i, (shard_sum, c))| ShardResult {
                    shard_sum,
                    c_ab_term: if i == 0 { Some(c) } else { None },
                })
                .collect();
            Ok(Some(combine_shards(&results)))
        } else {
            Ok(None)
        }
    }
}

mod tcp_impl {
    use super::*;

    fn write_shard_result(stream: &mut TcpStream, result: &ShardResult<i64>) -> Result<()> {
        stream.write_all(&result.shard_sum.to_le_bytes())?;
        let c = result.c_ab_term.unwrap_or(0);
        stream.write_all(&c.to_le_bytes())?;
        stream.write_all(&[result.c_ab_term.is_some() as u8])?;
        Ok(())
    }

    fn read_shard_result(stream: &mut TcpStream) -> Result<ShardResult<i64>> {
        let mut buf8 = [0u8; 8];
        stream.read_exact(&mut buf8)?;
        let shard_sum = i64::from_le_bytes(buf8);
        stream.read_exact(&mut buf8)?;
        let c = i64::from_le_bytes(buf8);
        let mut flag = [0u8; 1];
        stream.read_exact(&mut flag)?;
        let c_ab_term = if flag[0] != 0 { Some(c) } else { None };
        Ok(ShardResult { shard_sum, c_ab_term })
    }

    fn write_assignment(stream: &mut TcpStream, rank: usize, ranks: usize, args: &Args) -> Result<()> {
        stream.write_all(&args.x.to_le_bytes())?;
        stream.write_all(&args.y.to_le_bytes())?;
        stream.write_all(&(rank as u64).to_le_bytes())?;
        stream.write_all(&(ranks as u64).to_le_bytes())?;
        stream.write_all(&(args.threads as u64).to_le_bytes())?;
        Ok(())
    }

    fn read_assignment(stream: &mut TcpStream) -> Result<(i64, i64, usize, usize, usize)> {
        let mut buf8 = [0u8; 8];
        stream.read_exact(&mut buf8)?;
        let x = i64::from_le_bytes(buf8);
        stream.read_exact(&mut buf8)?;
        let y = i64::from_le_bytes(buf8);
        stream.read_exact(&mut buf8)?;
        let rank = u64::from_le_bytes(buf8) as usize;
        stream.read_exact(&mut buf8)?;
        let ranks = u64::from_le_bytes(buf8) as usize;
        stream.read_exact(&mut buf8)?;
        let threads = u64::from_le_bytes(buf8) as usize;
        Ok((x, y, rank, ranks, threads))
    }

    fn compute_shard(x: i64, y: i64, rank: usize, ranks: usize, threads: usize, status: Option<StatusConfig>) -> Result<ShardResult<i64>> {
        let sqrt_x = isqrt(x);
        let z = x / y.max(1);
        let table = SievedPrimeTable::new(sqrt_x.max(z).max(2) as u64)?;
        table.extend_to(z.max(2) as u64)?;
        Ok(run_shard::<i64>(x, y, z, threads, rank, ranks, &table, status)?)
    }

    pub fn run_master(args: &Args) -> Result<i64> {
        let total_ranks = args.workers + 1;
        let listener = TcpListener::bind(&args.master_addr).context("failed to bind master address")?;
        println!("Master listening on {}", args.master_addr);
        println!("Waiting for {} workers to connect...", args.workers);

        let mut workers: Vec<TcpStream> = Vec::new();
        for i in 0..args.workers {
            let (stream, addr) = listener.accept().context("accept failed")?;
            println!("  Worker {} connected from {}", i, addr);
            workers.push(stream);
        }

        for (i, worker) in workers.iter_mut().enumerate() {
            write_assignment(worker, i + 1, total_ranks, args).context("failed to send assignment")?;
        }

        let status = args.status.then_some(StatusConfig { decimals: 1 });
        let master_result = compute_shard(args.x, args.y, 0, total_ranks, args.threads, status)?;

        let mut results = vec![master_result];
        for worker in workers.iter_mut() {
            results.push(read_shard_result(worker).context("failed to read worker result")?);
        }

        Ok(combine_shards(&results))
    }

    pub fn run_worker(args: &Args) -> Result<()> {
        println!("Connecting to master at {}...", args.master_addr);
        let mut stream = TcpStream::connect(&args.master_addr).context("connection failed")?;
        println!("Connected to master");

        let (x, y, rank, ranks, threads) = read_assignment(&mut stream)?;
        let result = compute_shard(x, y, rank, ranks, threads, None)?;
        write_shard_result(&mut stream, &result)?;
        println!("Result sent to master");
        Ok(())
    }
}

fn run_simulated(args: &Args) -> Result<i64> {
    let status = args.status.then_some(StatusConfig { decimals: 1 });
    Ok(p2_distributed_simulated::<i64>(args.x, args.y, args.threads, args.ranks.max(1), status)?)
}

fn print_result(label: &str, ranks: usize, result: i64, elapsed_ms: f64, args: &Args) {
    if args.csv {
        println!("{},{},{},{},{:.3},{}", args.x, args.y, args.threads, ranks, elapsed_ms, result);
    } else {
        println!("===============================================================");
        println!("          DISTRIBUTED P2 CALCULATION RESULTS ({})", label);
        println!("===============================================================");
        println!("  Ranks:               {:>16}", ranks);
        println!("  P2(x, y):            {:>16}", result);
        println!("  Execution time:      {:>12.3} ms", elapsed_ms);
        println!("===============================================================");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.threads == 0 {
        bail!("threads must be at least 1");
    }

    if args.worker {
        return tcp_impl::run_worker(&args);
    }

    if args.tcp {
        let start = Instant::now();
        let result = tcp_impl::run_master(&args)?;
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        print_result("TCP", args.workers + 1, result, elapsed, &args);
        return Ok(());
    }

    #[cfg(feature = "mpi")]
    {
        let start = Instant::now();
        if let Some(result) = mpi_impl::run_mpi(&args)? {
            let elapsed = start.elapsed().as_secs_f64() * 1000.0;
            print_result("MPI", 0, result, elapsed, &args);
        }
        return Ok(());
    }

    #[cfg(not(feature = "mpi"))]
    {
        if !args.csv {
            println!("Running in-process rank simulation (no MPI, no --tcp)");
        }
        let start = Instant::now();
        let result = run_simulated(&args)?;
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        print_result("simulated", args.ranks.max(1), result, elapsed, &args);
        Ok(())
    }
}
