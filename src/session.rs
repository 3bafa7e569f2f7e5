//! 会话状态
//!
//! 把原本散落在 UI 外壳里的全局可变状态（分镜列表、风格档案、
//! 生成结果缓存、在途集合）收敛为一个显式的状态结构，
//! 由协调器持有并传给各工作流函数。
//!
//! 并发约定：所有字段都通过 [`SharedSession`] 的互斥锁访问，
//! 锁绝不跨越 `.await` 持有。

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::{Scene, SceneDraft, SceneId, StyleProfile};

/// 会话内的全部可变状态
#[derive(Debug, Default)]
pub struct SessionState {
    /// 分镜存储（插入序即拆解序，用于展示和批量遍历）
    scenes: Vec<Scene>,
    /// 当前风格档案（每个会话最多一份）
    style: Option<StyleProfile>,
    /// 生成结果缓存：分镜 id -> 图片 URL 列表（整体覆盖，不合并）
    results: HashMap<SceneId, Vec<String>>,
    /// 在途集合：正在生成中的分镜 id
    in_flight: HashSet<SceneId>,
    /// id 分配计数器（会话内只增不减，保证 id 不复用）
    next_id: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 载入一批新拆解出的分镜
    ///
    /// 为每个条目分配新的唯一 id，并清空旧的分镜、结果缓存和在途集合
    /// （新剧本意味着旧缓存键全部失效）。返回载入的分镜数量。
    pub fn load_scenes(&mut self, drafts: Vec<SceneDraft>) -> usize {
        self.scenes.clear();
        self.results.clear();
        self.in_flight.clear();

        for draft in drafts {
            self.next_id += 1;
            self.scenes.push(Scene {
                id: SceneId::new(self.next_id),
                scene_number: draft.scene,
                script: draft.script,
                prompt: draft.prompt,
            });
        }

        self.scenes.len()
    }

    /// 清空分镜列表（拆解失败时调用，不保留部分结果）
    pub fn clear_scenes(&mut self) {
        self.scenes.clear();
        self.results.clear();
        self.in_flight.clear();
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| &s.id == id)
    }

    /// 修改某个分镜的提示词（prompt 是唯一允许修改的字段）
    pub fn update_prompt(&mut self, id: &SceneId, prompt: impl Into<String>) -> bool {
        match self.scenes.iter_mut().find(|s| &s.id == id) {
            Some(scene) => {
                scene.prompt = prompt.into();
                true
            }
            None => false,
        }
    }

    /// 整体替换风格档案
    pub fn set_style(&mut self, style: StyleProfile) {
        self.style = Some(style);
    }

    /// 清空风格档案（显式移除或分析失败时）
    pub fn clear_style(&mut self) {
        self.style = None;
    }

    pub fn style(&self) -> Option<&StyleProfile> {
        self.style.as_ref()
    }

    /// 批量生成的候选列表：尚无结果缓存的分镜 id，按存储顺序
    pub fn pending_scene_ids(&self) -> Vec<SceneId> {
        self.scenes
            .iter()
            .filter(|s| !self.results.contains_key(&s.id))
            .map(|s| s.id.clone())
            .collect()
    }

    /// 尝试把分镜标记为在途
    ///
    /// 分镜不存在或已在途时返回 false；该检查与标记在同一把锁内完成，
    /// 是"同一分镜不可重入生成"的硬保证
    pub fn try_begin_generation(&mut self, id: &SceneId) -> bool {
        if self.scene(id).is_none() || self.in_flight.contains(id) {
            return false;
        }
        self.in_flight.insert(id.clone());
        true
    }

    /// 把分镜移出在途集合（成功或失败都必须调用）
    pub fn finish_generation(&mut self, id: &SceneId) {
        self.in_flight.remove(id);
    }

    /// 写入生成结果（覆盖旧条目）
    pub fn store_result(&mut self, id: &SceneId, urls: Vec<String>) {
        self.results.insert(id.clone(), urls);
    }

    pub fn result(&self, id: &SceneId) -> Option<&Vec<String>> {
        self.results.get(id)
    }

    pub fn is_in_flight(&self, id: &SceneId) -> bool {
        self.in_flight.contains(id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn results_count(&self) -> usize {
        self.results.len()
    }

    /// 按存储顺序遍历已有结果的分镜（用于导出）
    pub fn completed_scenes(&self) -> Vec<(Scene, Vec<String>)> {
        self.scenes
            .iter()
            .filter_map(|s| self.results.get(&s.id).map(|urls| (s.clone(), urls.clone())))
            .collect()
    }
}

/// 可在工作流之间共享的会话状态句柄
#[derive(Clone, Debug, Default)]
pub struct SharedSession(Arc<Mutex<SessionState>>);

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取状态锁
    ///
    /// 某个持锁线程 panic 导致锁中毒时直接接管内部数据，
    /// 状态本身始终保持可用
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
