use std::io::{stdout, Stdout, Write};

use crossterm::{cursor, terminal, ExecutableCommand, Result};

use super::status::SchedulerStatus;

// Fixed rows besides the queue and floor tables.
const HEADER_ROWS: u16 = 20;

pub struct Debug {
    stdout: Stdout,
    num_floors: u8,
    printed: u16,
}

impl Debug {
    pub fn new(num_floors: u8) -> Self {
        Debug {
            stdout: stdout(),
            num_floors: num_floors,
            printed: 0,
        }
    }

    pub fn printstatus(&mut self, status: &SchedulerStatus) -> Result<()> {
        if self.printed > 0 {
            self.stdout.execute(cursor::MoveUp(self.printed))?;
        }
        self.stdout.execute(terminal::Clear(terminal::ClearType::FromCursorDown))?;

        writeln!(self.stdout, "+-------------------------+")?;
        writeln!(self.stdout, "| SCHEDULER               |")?;
        writeln!(self.stdout, "+------------+------------+")?;
        writeln!(self.stdout, "| {0:<10} | {1:<10} |", "STATE", status.state.to_string())?;
        writeln!(self.stdout, "+------------+------------+")?;
        writeln!(self.stdout, "| {0:<10} | {1:<10} |", "RUNNING", status.in_flight.as_deref().unwrap_or("-"))?;
        writeln!(self.stdout, "+------------+------------+")?;
        writeln!(self.stdout, "| {0:<10} | {1:<10} |", "AMBIENT", status.ambient.to_string())?;
        writeln!(self.stdout, "+------------+------------+")?;
        writeln!(self.stdout, "| {0:<10} | {1:<10} |", "CANCEL", status.cancel_pending)?;
        writeln!(self.stdout, "+------------+------------+\n")?;

        writeln!(self.stdout, "+-------------------------+")?;
        writeln!(self.stdout, "| QUEUE ({0:<3})             |", status.queued.len())?;
        writeln!(self.stdout, "+-------------------------+")?;
        for action in &status.queued {
            writeln!(self.stdout, "| {0:<23} |", action)?;
        }
        writeln!(self.stdout, "+-------------------------+\n")?;

        writeln!(self.stdout, "+------------+------------+")?;
        writeln!(self.stdout, "| {0:<10} | {1:<10} |", "FLOOR", "LIT")?;
        for i in (0..self.num_floors).rev() {
            let lit = status.lit_floors.get(i as usize).copied().unwrap_or(false);
            writeln!(self.stdout, "| {0:<10} | {1:<10} |", i, lit)?;
        }
        writeln!(self.stdout, "+------------+------------+")?;

        self.printed = HEADER_ROWS + status.queued.len() as u16 + self.num_floors as u16;
        Ok(())
    }
}
