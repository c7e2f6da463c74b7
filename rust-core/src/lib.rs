pub mod game;
pub mod storage;
pub mod utils;

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use futures_util::StreamExt;
use gloo_timers::future::{IntervalStream, TimeoutFuture};
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::js_sys::Function;

pub use game::{
    completing_card, find_match, format_clock, generate_deck, has_any_match, is_match, Board,
    Card, Color, ConfigError, Deck, DeckError, DeckIndex, Feedback, FeedbackKind, Number,
    Replacement, Selection, Session, SessionConfig, SessionError, SessionEvent, SessionPhase,
    SessionView, Shading, Shape, SlotView, DECK_SIZE, DEFAULT_BOARD_SIZE,
};
pub use storage::{LocalStorageStore, MemoryStore, ScoreStore, StorageError};

const TICK_MS: u32 = 1_000;

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// 浏览器侧持有的会话以及订阅变化的 JS 回调。
struct Host {
    session: Session,
    listener: Option<Function>,
}

type SharedHost = Rc<RefCell<Host>>;

/// 把事件推给 JS 回调。调用前已释放借用，回调里可以再次操作游戏。
fn notify(host: &SharedHost, events: &[SessionEvent]) {
    if events.is_empty() {
        return;
    }
    let listener = host.borrow().listener.clone();
    let Some(listener) = listener else {
        return;
    };
    match to_value(events) {
        Ok(payload) => {
            if let Err(err) = listener.call1(&JsValue::NULL, &payload) {
                utils::warn(&format!("listener threw: {err:?}"));
            }
        }
        Err(err) => utils::warn(&format!("events not serializable: {err}")),
    }
}

/// 为 `epoch` 对应的一局启动倒计时，按固定间隔触发，不随处理耗时漂移。
///
/// 一旦 `epoch` 过期（重新开始、重置或已结算），`tick` 返回空事件，循环随之退出，
/// 因此任何时刻最多只有一个计时器能改动进行中的会话。
fn arm_countdown(host: &SharedHost, epoch: u64) {
    let host = Rc::clone(host);
    spawn_local(async move {
        let mut ticks = IntervalStream::new(TICK_MS);
        while ticks.next().await.is_some() {
            let events = host.borrow_mut().session.tick(epoch);
            if events.is_empty() {
                break;
            }
            let ended = events
                .iter()
                .any(|event| matches!(event, SessionEvent::SessionEnded { .. }));
            notify(&host, &events);
            if ended {
                break;
            }
        }
    });
}

fn arm_feedback_clear(host: &SharedHost, token: u64) {
    let delay = host.borrow().session.config().feedback_ms;
    let host = Rc::clone(host);
    spawn_local(async move {
        TimeoutFuture::new(delay).await;
        let events = host.borrow_mut().session.clear_feedback(token);
        notify(&host, &events);
    });
}

fn dispatch(host: &SharedHost, events: &[SessionEvent]) {
    for event in events {
        match event {
            SessionEvent::SessionStarted { epoch, .. } => arm_countdown(host, *epoch),
            SessionEvent::FeedbackShown { feedback } => arm_feedback_clear(host, feedback.token),
            _ => {}
        }
    }
    notify(host, events);
}

#[wasm_bindgen]
pub struct SetGame {
    host: SharedHost,
}

impl SetGame {
    fn run<F>(&self, action: F) -> Result<JsValue, JsValue>
    where
        F: FnOnce(&mut Session) -> Result<Vec<SessionEvent>, SessionError>,
    {
        let events = {
            let mut host = self.host.borrow_mut();
            action(&mut host.session).map_err(to_js_error)?
        };
        dispatch(&self.host, &events);
        to_value(&events).map_err(JsValue::from)
    }
}

#[wasm_bindgen]
impl SetGame {
    /// `config_json` 为空时使用默认规则（120 秒、12 张牌）。
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<SetGame, JsValue> {
        let config: SessionConfig = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => SessionConfig::default(),
        };
        let store = LocalStorageStore::new(config.history_key.clone());
        let session = Session::new(config, Box::new(store)).map_err(to_js_error)?;
        Ok(SetGame {
            host: Rc::new(RefCell::new(Host {
                session,
                listener: None,
            })),
        })
    }

    /// 注册状态变化回调，参数为本次产生的事件数组。
    #[wasm_bindgen(js_name = "setListener")]
    pub fn set_listener(&self, listener: Option<Function>) {
        self.host.borrow_mut().listener = listener;
    }

    pub fn start(&self) -> Result<JsValue, JsValue> {
        self.run(Session::start)
    }

    pub fn reset(&self) -> Result<JsValue, JsValue> {
        self.run(Session::reset)
    }

    pub fn restart(&self) -> Result<JsValue, JsValue> {
        self.run(Session::restart)
    }

    pub fn acknowledge(&self) -> Result<JsValue, JsValue> {
        self.run(Session::acknowledge)
    }

    #[wasm_bindgen(js_name = "activateSlot")]
    pub fn activate_slot(&self, slot: u32) -> Result<JsValue, JsValue> {
        self.run(|session| session.toggle_slot(slot as usize))
    }

    #[wasm_bindgen(js_name = "claimMatch")]
    pub fn claim_match(&self) -> Result<JsValue, JsValue> {
        self.run(Session::claim_match)
    }

    #[wasm_bindgen(js_name = "claimNoMatch")]
    pub fn claim_no_match(&self) -> Result<JsValue, JsValue> {
        self.run(Session::claim_no_match)
    }

    pub fn score(&self) -> i32 {
        self.host.borrow().session.score()
    }

    #[wasm_bindgen(js_name = "remainingSecs")]
    pub fn remaining_secs(&self) -> u32 {
        self.host.borrow().session.remaining_secs()
    }

    pub fn history(&self) -> Vec<i32> {
        self.host.borrow().session.history().to_vec()
    }

    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_value(&self.host.borrow().session.view()).map_err(JsValue::from)
    }

    pub fn view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.host.borrow().session.view()).map_err(serde_to_js_error)
    }

    /// 当前棋盘上第一组合法组合的槽位，调试用。
    pub fn hint(&self) -> Result<JsValue, JsValue> {
        let host = self.host.borrow();
        let slots = match (host.session.deck(), host.session.board()) {
            (Some(deck), Some(board)) => find_match(&board.cards(deck)),
            _ => None,
        };
        to_value(&slots).map_err(JsValue::from)
    }
}

#[wasm_bindgen(js_name = "generateDeck")]
pub fn generate_deck_js() -> Result<JsValue, JsValue> {
    to_value(&generate_deck().cards()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "isMatch")]
pub fn is_match_js(a: JsValue, b: JsValue, c: JsValue) -> Result<bool, JsValue> {
    let a: Card = from_value(a).map_err(JsValue::from)?;
    let b: Card = from_value(b).map_err(JsValue::from)?;
    let c: Card = from_value(c).map_err(JsValue::from)?;
    Ok(is_match(&a, &b, &c))
}

#[wasm_bindgen(js_name = "hasAnyMatch")]
pub fn has_any_match_js(cards: JsValue) -> Result<bool, JsValue> {
    let cards: Vec<Card> = from_value(cards).map_err(JsValue::from)?;
    Ok(has_any_match(&cards))
}

#[wasm_bindgen(js_name = "findMatch")]
pub fn find_match_js(cards: JsValue) -> Result<JsValue, JsValue> {
    let cards: Vec<Card> = from_value(cards).map_err(JsValue::from)?;
    to_value(&find_match(&cards)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "formatClock")]
pub fn format_clock_js(secs: u32) -> String {
    format_clock(secs)
}
