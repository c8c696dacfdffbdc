use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Previewed,
    Declined,
    Failed,
}

pub struct ProgressIndicator {
    total: usize,
    written: usize,
    previewed: usize,
    declined: usize,
    failed: usize,
    start_time: Instant,
}

impl ProgressIndicator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            written: 0,
            previewed: 0,
            declined: 0,
            failed: 0,
            start_time: Instant::now(),
        }
    }

    pub fn start_item(&self, path: &str) {
        println!(
            "\nFile: {} ({}/{})",
            path,
            self.written + self.previewed + self.declined + self.failed + 1,
            self.total
        );
    }

    pub fn complete_item(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Written => self.written += 1,
            Outcome::Previewed => self.previewed += 1,
            Outcome::Declined => self.declined += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn previewed(&self) -> usize {
        self.previewed
    }

    pub fn declined(&self) -> usize {
        self.declined
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn finish(&self, dry_run: bool) {
        let elapsed = self.start_time.elapsed();
        println!("\n{}", "=".repeat(60));
        println!("Summary:");
        println!("  Total:     {}", self.total);
        if dry_run {
            println!("  Previewed: {}", self.previewed);
        } else {
            println!("  Written:   {}", self.written);
        }
        println!("  Declined:  {}", self.declined);
        println!("  Failed:    {}", self.failed);
        println!("  Duration:  {:.2}s", elapsed.as_secs_f64());
        println!("{}", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_are_counted_separately() {
        let mut progress = ProgressIndicator::new(5);
        progress.complete_item(Outcome::Written);
        progress.complete_item(Outcome::Written);
        progress.complete_item(Outcome::Previewed);
        progress.complete_item(Outcome::Declined);
        progress.complete_item(Outcome::Failed);

        assert_eq!(progress.written(), 2);
        assert_eq!(progress.previewed(), 1);
        assert_eq!(progress.declined(), 1);
        assert_eq!(progress.failed(), 1);
    }
}
