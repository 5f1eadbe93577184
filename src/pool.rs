use std::sync::mpsc::channel;
use std::sync::Mutex;
use std::thread;

/// Run `work` over `jobs` on up to `workers` threads and return the results in
/// job order.  Workers pull from a shared queue, so a slow job only holds up
/// its own thread.
pub fn run_jobs<J, R, F>(jobs: Vec<J>, workers: usize, work: F) -> Vec<R>
where
    J: Send,
    R: Send,
    F: Fn(J) -> R + Sync,
{
    let job_count = jobs.len();
    let workers = workers.max(1).min(job_count.max(1));
    let queue = Mutex::new(jobs.into_iter().enumerate());
    let (result_tx, result_rx) = channel();

    info!("Starting {} worker threads for {} jobs...", workers, job_count);
    thread::scope(|scope| {
        for worker in 0..workers {
            let result_tx = result_tx.clone();
            let queue = &queue;
            let work = &work;
            scope.spawn(move || loop {
                let next = match queue.lock() {
                    Ok(mut jobs) => jobs.next(),
                    Err(poisoned) => poisoned.into_inner().next(),
                };
                let (idx, job) = match next {
                    Some(next) => next,
                    None => break,
                };
                trace!(worker, job = idx, "running job");
                if result_tx.send((idx, work(job))).is_err() {
                    break;
                }
            });
        }
    });
    drop(result_tx);

    let mut results: Vec<(usize, R)> = result_rx.into_iter().collect();
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_come_back_in_job_order() {
        let jobs: Vec<u64> = (0..50).collect();
        let out = run_jobs(jobs, 4, |n| {
            if n % 7 == 0 {
                std::thread::sleep(std::time::Duration::from_millis(2));
            }
            n * n
        });
        assert_eq!(out, (0..50).map(|n| n * n).collect::<Vec<u64>>());
    }

    #[test]
    fn no_jobs_no_results() {
        let out: Vec<u32> = run_jobs(Vec::<u32>::new(), 8, |n| n);
        assert!(out.is_empty());
    }
}
