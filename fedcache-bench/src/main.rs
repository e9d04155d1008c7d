// Copyright 2026 fedcache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Synthetic request workload against the caches of a federated server.
//!
//! Readers resolve accounts, follow lists and visibility decisions through the caches, with loaders that emulate a
//! database round trip. Writers invalidate random accounts, which cascades to follow lists and decisions.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use bytesize::MIB;
use clap::Parser;
use fedcache::prelude::*;
use futures_util::future::join_all;
use itertools::Itertools;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tokio::sync::broadcast;

/// Arguments of fedcache-bench.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Memory target of all caches. (MiB)
    #[arg(long, default_value_t = 64)]
    mem: usize,

    /// (s)
    #[arg(short, long, default_value_t = 10)]
    time: u64,

    /// (s)
    #[arg(long, default_value_t = 2)]
    report_interval: u64,

    /// Distinct accounts in the workload.
    #[arg(long, default_value_t = 100_000)]
    accounts: u64,

    /// Following count of every account.
    #[arg(long, default_value_t = 50)]
    follows: usize,

    /// Emulated latency of a storage read.
    #[arg(long, default_value = "1ms", value_parser = humantime::parse_duration)]
    db_latency: Duration,

    /// TTL of cached entries. Unset keeps entries until evicted or invalidated.
    #[arg(long, value_parser = humantime::parse_duration)]
    ttl: Option<Duration>,

    /// Reader count.
    #[arg(long, default_value_t = 16)]
    readers: usize,

    /// Writer count.
    #[arg(long, default_value_t = 2)]
    writers: usize,

    /// Pause between two invalidations of a writer.
    #[arg(long, default_value = "1ms", value_parser = humantime::parse_duration)]
    write_interval: Duration,
}

#[derive(Debug, Default)]
struct Counter {
    ops: AtomicU64,
    loads: AtomicU64,
}

impl Counter {
    fn snapshot(&self) -> (u64, u64) {
        (self.ops.load(Ordering::Relaxed), self.loads.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Default)]
struct Metrics {
    accounts: Counter,
    follows: Counter,
    decisions: Counter,
    invalidations: AtomicU64,
}

impl Metrics {
    fn report(&self, elapsed: Duration) -> String {
        let secs = elapsed.as_secs_f64().max(f64::EPSILON);
        let line = |name: &str, counter: &Counter| {
            let (ops, loads) = counter.snapshot();
            let hit_ratio = if ops == 0 { 0.0 } else { 1.0 - loads as f64 / ops as f64 };
            format!(
                "{name:>10}: {ops:>10} ops, {:>10.0} ops/s, {loads:>8} loads, hit ratio {:.2}%",
                ops as f64 / secs,
                hit_ratio * 100.0
            )
        };
        [
            line("accounts", &self.accounts),
            line("follows", &self.follows),
            line("decisions", &self.decisions),
            format!(
                "{:>10}: {:>10}",
                "invalidate",
                self.invalidations.load(Ordering::Relaxed)
            ),
        ]
        .into_iter()
        .join("\n")
    }
}

struct Context {
    caches: Caches,
    args: Args,
    metrics: Metrics,
}

impl Context {
    /// Pick an account ID, skewed towards a hot set.
    fn account_id(&self, rng: &mut SmallRng) -> String {
        let x: f64 = rng.random();
        format!("{:026}", (x * x * self.args.accounts as f64) as u64)
    }

    async fn fetch_account(&self, id: &str) -> Result<Account> {
        self.metrics.accounts.loads.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.args.db_latency).await;
        Ok(Account {
            id: id.to_string(),
            username: format!("user{id}"),
            uri: format!("https://social.example/users/{id}"),
            url: format!("https://social.example/@{id}"),
            ..Default::default()
        })
    }

    async fn fetch_follows(&self, id: &str) -> Result<Vec<String>> {
        self.metrics.follows.loads.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.args.db_latency).await;
        Ok((0..self.args.follows).map(|i| format!("{id}-{i}")).collect())
    }

    async fn decide(&self, requester_id: &str, subject_id: &str) -> Result<Verdict> {
        self.metrics.decisions.loads.fetch_add(1, Ordering::Relaxed);
        // A visibility check reads several rows.
        tokio::time::sleep(self.args.db_latency * 3).await;
        Ok(Verdict::from(requester_id <= subject_id))
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logger() {
    use tracing_subscriber::{prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_line_number(true))
        .with(EnvFilter::from_default_env())
        .init();
}

#[cfg(feature = "tracing")]
fn init_logger() {
    use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_line_number(true),
        )
        .with(EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    #[cfg(feature = "deadlock")]
    {
        std::thread::spawn(move || loop {
            std::thread::sleep(Duration::from_secs(1));
            let deadlocks = parking_lot::deadlock::check_deadlock();
            if deadlocks.is_empty() {
                continue;
            }

            println!("{} deadlocks detected", deadlocks.len());
            for (i, threads) in deadlocks.iter().enumerate() {
                println!("Deadlock #{}", i);
                for t in threads {
                    println!("Thread Id {:#?}", t.thread_id());
                    println!("{:#?}", t.backtrace());
                }
            }
            panic!()
        });
    }

    let args = Args::parse();
    println!("{:#?}", args);
    anyhow::ensure!(args.accounts > 0, "\"--accounts\" value must be greater than 0");

    let config = CacheConfig {
        memory_target: args.mem * MIB as usize,
        ttl: args.ttl,
        ..Default::default()
    };
    let caches = Caches::new(&config)?;
    caches.start();

    let context = Arc::new(Context {
        caches,
        args: args.clone(),
        metrics: Metrics::default(),
    });

    let (stop_tx, _) = broadcast::channel(16);

    let handle_monitor = tokio::spawn(monitor(context.clone(), stop_tx.subscribe()));
    let handle_signal = tokio::spawn({
        let stop_tx = stop_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("fedcache-bench is cancelled with CTRL-C");
                let _ = stop_tx.send(());
            }
        }
    });

    let start = Instant::now();

    let r_handles = (0..args.readers)
        .map(|id| tokio::spawn(read(id as u64, context.clone(), stop_tx.subscribe())))
        .collect_vec();
    let w_handles = (0..args.writers)
        .map(|id| tokio::spawn(write(id as u64, context.clone(), stop_tx.subscribe())))
        .collect_vec();

    for res in join_all(r_handles.into_iter().chain(w_handles)).await {
        res??;
    }
    let elapsed = start.elapsed();

    handle_monitor.abort();
    handle_signal.abort();
    context.caches.stop();

    println!("\nTotal:\n{}", context.metrics.report(elapsed));
    println!(
        "\nResident: {} accounts, {} follow lists, {} decisions",
        context.caches.db.account.len(),
        context.caches.db.follow_ids.len(),
        context.caches.visibility.len()
    );

    Ok(())
}

fn stopped(stop: &mut broadcast::Receiver<()>) -> bool {
    !matches!(stop.try_recv(), Err(broadcast::error::TryRecvError::Empty))
}

async fn read(id: u64, context: Arc<Context>, mut stop: broadcast::Receiver<()>) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(id);
    let start = Instant::now();
    let time = Duration::from_secs(context.args.time);

    while start.elapsed() < time && !stopped(&mut stop) {
        let account_id = context.account_id(&mut rng);
        context
            .caches
            .db
            .account
            .load_one("id", account_id.as_str(), || context.fetch_account(&account_id))
            .await?;
        context.metrics.accounts.ops.fetch_add(1, Ordering::Relaxed);

        let key = format!(">{account_id}");
        context
            .caches
            .db
            .follow_ids
            .load(&key, || context.fetch_follows(&account_id))
            .await?;
        context.metrics.follows.ops.fetch_add(1, Ordering::Relaxed);

        let requester_id = context.account_id(&mut rng);
        context
            .caches
            .visibility
            .load_one(DecisionType::AccountVisible, Some(requester_id.as_str()), &account_id, || {
                context.decide(&requester_id, &account_id)
            })
            .await?;
        context.metrics.decisions.ops.fetch_add(1, Ordering::Relaxed);
    }

    Ok(())
}

async fn write(id: u64, context: Arc<Context>, mut stop: broadcast::Receiver<()>) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(u64::MAX - id);
    let start = Instant::now();
    let time = Duration::from_secs(context.args.time);

    while start.elapsed() < time && !stopped(&mut stop) {
        let account_id = context.account_id(&mut rng);
        context.caches.db.account.invalidate_ids("id", [&account_id]);
        context.metrics.invalidations.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(context.args.write_interval).await;
    }

    Ok(())
}

async fn monitor(context: Arc<Context>, mut stop: broadcast::Receiver<()>) {
    let start = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_secs(context.args.report_interval.max(1)));
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.recv() => return,
        }
        println!("[{:.0?}]\n{}\n", start.elapsed(), context.metrics.report(start.elapsed()));
    }
}
