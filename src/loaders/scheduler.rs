use std::time::{Duration, Instant, SystemTime};

use failure::Error as FailureError;
use futures::{future, Future, Stream};
use tokio::timer::Interval;

use controller::context::DynamicContext;
use services::{SchedulerService, Service};
use AppStaticContext;

#[derive(Clone)]
pub struct SchedulerContext {
    pub static_context: AppStaticContext,
    pub interval: Duration,
}

pub fn run(ctx: SchedulerContext) -> impl Future<Item = (), Error = FailureError> {
    Interval::new(Instant::now(), ctx.interval)
        .map_err(FailureError::from)
        .fold(ctx, |ctx, _| {
            info!("Started scheduled marketplace tasks");
            run_tasks(ctx.static_context.clone()).then(move |_| {
                info!("Finished scheduled marketplace tasks");
                future::ok::<_, FailureError>(ctx)
            })
        }).map(|_| ())
}

/// Tasks run one after another, a failed task does not stop the rest
fn run_tasks(static_context: AppStaticContext) -> Box<Future<Item = (), Error = ()>> {
    let service = Service::new(static_context, DynamicContext::default());
    let now = SystemTime::now();

    Box::new(
        service
            .expire_offers(now)
            .then(|res| report("expire offers", res.map(|offers| offers.len())))
            .and_then(move |_| {
                service
                    .expire_order_requests(now)
                    .then(|res| report("expire order requests", res.map(|requests| requests.len())))
                    .and_then(move |_| {
                        service
                            .compute_reward_payouts()
                            .then(|res| report("compute reward payouts", res.map(|orders| orders.len())))
                    })
            }),
    )
}

fn report(task: &str, result: Result<usize, FailureError>) -> Result<(), ()> {
    match result {
        Ok(count) => info!("Scheduled task {} done, {} records affected.", task, count),
        Err(err) => {
            let err = FailureError::from(err.context(format!("An error occurred in scheduled task {}", task)));
            error!("{:?}", err);
        }
    }
    Ok(())
}
