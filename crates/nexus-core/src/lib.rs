//! Nexus discovery engine core.
//!
//! Builds structured queries from free-text and faceted filter tokens, runs
//! saved queries as scheduled agents that report only unseen results, maps a
//! draggable two-handle time window onto a date domain, ranks result sets and
//! paints them in four spatial modes onto an abstract drawing surface.
//!
//! Zero I/O. Query execution, storage, clocks and drawing targets are ports
//! implemented by the embedding application.

pub mod agent;
pub mod constants;
pub mod filter;
pub mod persist;
pub mod ranking;
pub mod render;
pub mod scheduler;
pub mod search;
pub mod time;
pub mod timeline;

pub use agent::{Agent, AgentDraft, Cadence, ValidationError};
pub use constants::{AGENT_PALETTE, DAY_MS, HOUR_MS, MIN_FRAME_INTERVAL_MS, MIN_GAP};
pub use filter::{AdvancedFilterSet, ComposedQuery, FilterToken, Mood, QueryModel, SavedSearch};
pub use persist::{KeyValueStore, Loaded, MemoryStore, PersistError};
pub use ranking::{GeoPoint, ResultRecord, ResultSet, SortOption, sort_results};
pub use render::{
    AnimationToken, DrawOp, FrameOutcome, ModeChange, Point, RecordingSurface, RenderMode,
    Renderer, Rgba, Scene, SpatialView, Surface, ViewState,
};
pub use scheduler::{
    AgentState, CollectingSink, Dispatch, Notification, NotificationSink, Scheduler,
    SchedulerError, SchedulerService, TickPlan, TickReport,
};
pub use search::{ExecutionError, QueryExecutor, QueryRequest};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
pub use timeline::{DragState, Handle, Preset, RangeControl, TimeDomain, TimeRange, Track};
