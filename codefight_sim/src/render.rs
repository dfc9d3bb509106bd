//! Text rendering of the arena and of placed programs.

use crate::startup::DisplaySymbols;
use codefight_core::{Elimination, Engine, ProgramIdentity, ProgramSnapshot, ProgramSymbols};
use std::collections::HashMap;

/// Rows shown by the detailed memory table when the arena is larger.
pub const DETAIL_ROWS: usize = 10;

/// One symbol per cell, in address order.
///
/// Later rules win: unchanged, owner, bomb, other alive pointers, then the
/// pointer of the program that runs next.
pub fn cell_symbols(engine: &Engine, display: &DisplaySymbols) -> Vec<String> {
    let owners: HashMap<&ProgramIdentity, &ProgramSymbols> = engine
        .roster()
        .iter()
        .filter_map(|p| p.symbols().map(|s| (p.identity(), s)))
        .collect();

    let mut symbols: Vec<String> = engine
        .arena()
        .iter()
        .map(|cell| {
            let owner = cell.last_modified_by.as_ref().and_then(|id| owners.get(id));
            match owner {
                Some(s) if cell.is_bomb() => s.bomb_symbol.clone(),
                Some(s) => s.symbol.clone(),
                None => display.unchanged.clone(),
            }
        })
        .collect();

    let mut queue = engine.queue();
    if let Some(head) = queue.next() {
        for program in queue {
            symbols[program.pointer()] = display.next.clone();
        }
        symbols[head.pointer()] = display.current.clone();
    }

    symbols
}

/// The one-line arena overview.
pub fn render_overview(engine: &Engine, display: &DisplaySymbols) -> String {
    cell_symbols(engine, display).concat()
}

/// Overview plus a table of cells starting at `start`.
///
/// Arenas of at most [`DETAIL_ROWS`] cells are shown whole and `start` is
/// ignored. Larger arenas show [`DETAIL_ROWS`] rows, wrapping, and bracket
/// the window in the overview with the window symbol.
pub fn render_detail(engine: &Engine, display: &DisplaySymbols, start: usize) -> String {
    let size = engine.arena_size();
    let symbols = cell_symbols(engine, display);

    let (first, rows) = if size > DETAIL_ROWS {
        (start % size, DETAIL_ROWS)
    } else {
        (0, size)
    };

    let header = if size > DETAIL_ROWS {
        let last = (first + rows - 1) % size;
        let mut line = String::new();
        for (i, symbol) in symbols.iter().enumerate() {
            if i == first {
                line.push_str(&display.window);
            }
            line.push_str(symbol);
            if i == last {
                line.push_str(&display.window);
            }
        }
        line
    } else {
        format!("[{}]", symbols.join(", "))
    };

    let table: Vec<[String; 7]> = (0..rows)
        .map(|offset| {
            let address = (first + offset) % size;
            let cell = engine.inspect_cell(address as i64);
            [
                symbols[address].clone(),
                format!("{}:", address),
                cell.opcode.to_string(),
                "|".to_string(),
                cell.operand_a.to_string(),
                "|".to_string(),
                cell.operand_b.to_string(),
            ]
        })
        .collect();

    let mut widths = [0usize; 7];
    for row in &table {
        for (w, entry) in widths.iter_mut().zip(row) {
            *w = (*w).max(entry.chars().count());
        }
    }

    let body: Vec<String> = table
        .iter()
        .map(|row| {
            row.iter()
                .zip(widths)
                .map(|(entry, w)| format!("{:>w$}", entry, w = w))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    format!("{}\n{}", header, body.join("\n"))
}

/// Status line for a placed program, plus its next instruction while alive.
pub fn render_program(snapshot: &ProgramSnapshot) -> String {
    let status = if snapshot.alive { "RUNNING" } else { "STOPPED" };
    let mut text = format!("{} ({}@{})", snapshot.identity, status, snapshot.round_counter);
    if let Some(next) = snapshot.next_instruction {
        text.push_str(&format!("\nNext Command: {} @ {}", next, snapshot.pointer));
    }
    text
}

/// One line per eliminated program.
pub fn render_eliminations(eliminations: &[Elimination]) -> String {
    eliminations
        .iter()
        .map(|e| format!("{} executed {} steps until stopping.", e.identity, e.final_round_counter))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use codefight_core::{EngineConfig, Instruction, OpCode, StepBudget};

    fn display() -> DisplaySymbols {
        DisplaySymbols::default()
    }

    fn engine(size: usize) -> Engine {
        let symbols = vec![ProgramSymbols::new("A", "a"), ProgramSymbols::new("B", "b")];
        Engine::new(EngineConfig::new(size).with_symbols(symbols)).unwrap()
    }

    fn duel(size: usize) -> Engine {
        let mut e = engine(size);
        e.register_program("bomber", vec![
            Instruction::new(OpCode::MovR, 2, 3),
            Instruction::new(OpCode::Jmp, -1, 0),
            Instruction::new(OpCode::Stop, 0, 0),
        ])
        .unwrap();
        e.register_program("idle", vec![Instruction::new(OpCode::Jmp, 0, 0)]).unwrap();
        e.start_match(&["bomber", "idle"]).unwrap();
        e
    }

    #[test]
    fn test_overview_after_placement() {
        let e = duel(10);
        assert_eq!(render_overview(&e, &display()), "@AA..*....");
    }

    #[test]
    fn test_overview_marks_bombs() {
        let mut e = duel(10);

        // bomber copies its STOP to address 3
        e.step(StepBudget::Turns(2));

        let overview = render_overview(&e, &display());
        assert_eq!(overview, "A@Aa.*....");
    }

    #[test]
    fn test_overview_without_alive_programs() {
        let mut e = engine(10);
        e.register_program("x", vec![Instruction::new(OpCode::Jmp, 1, 0)]).unwrap();
        e.register_program("y", vec![Instruction::new(OpCode::Jmp, 1, 0)]).unwrap();
        e.start_match(&["x", "y"]).unwrap();
        e.step(StepBudget::Unbounded);

        assert_eq!(render_overview(&e, &display()), "A....B....");
    }

    #[test]
    fn test_detail_small_arena() {
        let e = duel(10);

        let text = render_detail(&e, &display(), 7);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "[@, A, A, ., ., *, ., ., ., .]");
        assert_eq!(lines[1], "@ 0: MOV_R |  2 | 3");
        assert_eq!(lines[2], "A 1:   JMP | -1 | 0");
        assert_eq!(lines[10], ". 9:  STOP |  0 | 0");
    }

    #[test]
    fn test_detail_window_wraps() {
        let e = duel(12);

        let text = render_detail(&e, &display(), 8);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 1 + DETAIL_ROWS);
        assert_eq!(lines[0], "@AA...|*.|....");
        assert!(lines[1].starts_with(".  8:"));
        assert!(lines[5].starts_with("@  0:"));
        assert!(lines[10].starts_with(".  5:"));
    }

    #[test]
    fn test_render_program() {
        let e = duel(10);
        let bomber = e.find_program("bomber").unwrap();

        let alive = render_program(&e.inspect_program(&bomber).unwrap());
        assert_eq!(alive, "bomber (RUNNING@0)\nNext Command: MOV_R|2|3 @ 0");

        let stopped = ProgramSnapshot {
            identity: ProgramIdentity::numbered("bomber", 1),
            alive: false,
            round_counter: 7,
            pointer: 4,
            next_instruction: None,
        };
        assert_eq!(render_program(&stopped), "bomber#1 (STOPPED@7)");
    }

    #[test]
    fn test_render_eliminations() {
        let eliminations = vec![
            Elimination { identity: ProgramIdentity::numbered("imp", 0), final_round_counter: 3 },
            Elimination { identity: ProgramIdentity::unique("dwarf"), final_round_counter: 0 },
        ];
        assert_eq!(
            render_eliminations(&eliminations),
            "imp#0 executed 3 steps until stopping.\ndwarf executed 0 steps until stopping."
        );
    }
}
