//! WASM bindings for gomoku-core
//!
//! Lets a browser UI drive the engine. Move notifications are queued by an
//! internal subscriber and handed to JavaScript through `drainEvents`.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{Cell, CellStatus, Gomoku, Size};

/// A move notification as seen by JavaScript.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveEvent {
    cell: Cell,
    prev_status: CellStatus,
}

/// WASM-friendly wrapper around Gomoku
#[wasm_bindgen]
pub struct WasmGomoku {
    inner: Gomoku,
    events: Rc<RefCell<Vec<MoveEvent>>>,
}

#[wasm_bindgen]
impl WasmGomoku {
    /// Create a game on a `column x row` board. Throws on a zero dimension.
    #[wasm_bindgen(constructor)]
    pub fn new(column: u32, row: u32) -> Result<WasmGomoku, JsError> {
        let size = Size::new(column as usize, row as usize)?;
        let mut inner = Gomoku::new(size);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        inner.subscribe(move |cell, prev_status| {
            sink.borrow_mut().push(MoveEvent { cell, prev_status });
        });
        Ok(WasmGomoku { inner, events })
    }

    /// `{ cells, player, winner }` with `cells[x][y]` holding "Empty", "Black" or "White"
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.state())?)
    }

    /// `{ column, row }`
    #[wasm_bindgen(js_name = getSize)]
    pub fn get_size(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.size())?)
    }

    /// Try to place the current player's stone. Returns true if it was placed.
    #[wasm_bindgen(js_name = attemptMove)]
    pub fn attempt_move(&mut self, x: i32, y: i32) -> bool {
        self.inner.attempt_move(x, y).is_accepted()
    }

    /// Move events since the last drain, oldest first:
    /// `[{ cell: { x, y, status }, prevStatus }, ...]`
    ///
    /// Events queue until drained; call this after every `attemptMove`.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> Result<JsValue, JsValue> {
        let events = std::mem::take(&mut *self.events.borrow_mut());
        Ok(serde_wasm_bindgen::to_value(&events)?)
    }

    /// Winning run as `[x, y, x, y, ...]`. Empty while undecided.
    #[wasm_bindgen(js_name = winningLine)]
    pub fn winning_line(&self) -> Vec<i32> {
        self.inner
            .winning_line()
            .map(|line| line.iter().flat_map(|pos| [pos.x, pos.y]).collect())
            .unwrap_or_default()
    }

    /// Winner as "Black" or "White", or undefined
    pub fn winner(&self) -> Option<String> {
        self.inner.winner().map(|player| player.to_string())
    }
}
