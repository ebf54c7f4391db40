use minesweeper_player as ms;
use wasm_bindgen::prelude::*;

/// Move kinds appended to the state returned by [`next_square`].
const KIND_OPENING: u8 = 0;
const KIND_SAFE: u8 = 1;
const KIND_GUESS: u8 = 2;
const KIND_NONE: u8 = 3;

#[wasm_bindgen]
pub fn create_player() -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let engine = ms::DecisionEngine::new();
    engine.serialize().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn reset_player(bts: Vec<u8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut engine = ms::DecisionEngine::deserialize(&bts).map_err(|e| e.to_string())?;
    engine.reset();
    engine.serialize().map_err(|e| e.to_string())
}

/// Decides the next square for a board given as row-major values
/// (`-1` unchecked, `0..=8` revealed) with `width` columns.
///
/// Returns the updated player state followed by 9 trailing bytes: the move
/// kind, then the column and the row as little-endian `u32`s.
#[wasm_bindgen]
pub fn next_square(bts: Vec<u8>, cells: Vec<i8>, width: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut engine = ms::DecisionEngine::deserialize(&bts).map_err(|e| e.to_string())?;
    let board = ms::Board::from_values(width, &cells).map_err(|e| e.to_string())?;

    let decision = engine.decide_next_square(&board, &mut rand::rng());
    let kind = match decision {
        ms::Decision::Opening(_) => KIND_OPENING,
        ms::Decision::Safe(_) => KIND_SAFE,
        ms::Decision::Guess(_) => KIND_GUESS,
        ms::Decision::NoMoves => KIND_NONE,
    };
    let at = decision.cell().map(|cell| cell.anchor).unwrap_or_default();

    let mut xs = engine.serialize().map_err(|e| e.to_string())?;
    xs.push(kind);
    xs.extend((at.x as u32).to_le_bytes());
    xs.extend((at.y as u32).to_le_bytes());
    Ok(xs)
}

#[wasm_bindgen]
pub fn analyze_cells(cells: Vec<i8>, width: usize) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let board = ms::Board::from_values(width, &cells).map_err(|e| e.to_string())?;
    let analysis = ms::analyze(&board);

    // 1 = proven safe, 2 = deduced mine, 0 = unknown or revealed.
    let mut marks = vec![0i8; board.len()];
    for cell in &analysis.safe {
        if let Some(index) = board.index_of(cell.anchor) {
            marks[index] = 1;
        }
    }
    for cell in &analysis.mines {
        if let Some(index) = board.index_of(cell.anchor) {
            marks[index] = 2;
        }
    }
    Ok(marks)
}
