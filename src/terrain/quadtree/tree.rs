// ============================================
// QuadTree - Контейнер террейна
// ============================================
// Владеет ареной узлов, реестром моделей и компонентов.
// Узлы знают только id объектов, записи помнят свой узел.

use std::collections::HashMap;

use ultraviolet::Vec3;

use crate::config::{HeightInterpolation, TerrainConfig};
use crate::error::TerrainError;
use crate::render::{FrameContext, MeshAllocator, MeshRenderer, ModelRenderer};
use crate::terrain::heightfield::HeightField;
use super::build::build_hierarchy;
use super::node::{NodeArena, NodeId, QuadTreeNode, OUT_OF_RANGE};
use super::objects::{ComponentId, ComponentSlot, ModelId, ModelPlacement, TerrainComponent};

/// Террейн-квадродерево.
///
/// `G` - хэндл меша листа (см. `MeshAllocator::Mesh`),
/// `A` - ассет модели, который передаётся в `ModelRenderer`.
pub struct QuadTree<G, A> {
    /// None пока террейн не построен
    nodes: Option<NodeArena<G>>,
    total_width: f32,
    total_height: f32,
    cell_size: f32,
    sector_size: usize,
    culling: bool,
    interpolation: HeightInterpolation,
    models: HashMap<ModelId, ModelPlacement<A>>,
    components: HashMap<ComponentId, ComponentSlot<A>>,
    next_id: u64,
}

impl<G, A> QuadTree<G, A> {
    pub fn new() -> Self {
        Self::with_config(&TerrainConfig::default())
    }

    pub fn with_config(config: &TerrainConfig) -> Self {
        Self {
            nodes: None,
            total_width: 0.0,
            total_height: 0.0,
            cell_size: config.cell_size,
            sector_size: config.sector_size,
            culling: config.culling,
            interpolation: config.interpolation,
            models: HashMap::new(),
            components: HashMap::new(),
            next_id: 1,
        }
    }

    // ============================================
    // Построение
    // ============================================

    /// Построить иерархию из heightmap. Старая иерархия выбрасывается.
    /// При ошибке дерево остаётся не построенным, все объекты откреплены,
    /// но остаются зарегистрированными.
    pub fn create<D>(
        &mut self,
        allocator: &mut D,
        cell_size: f32,
        sector_size: usize,
        field: &HeightField,
    ) -> Result<(), TerrainError>
    where
        D: MeshAllocator<Mesh = G>,
    {
        self.discard();

        log::debug!(
            "[QuadTree] create: field {}x{}, cell {}, sector {}",
            field.width(),
            field.height(),
            cell_size,
            sector_size
        );

        let arena = match build_hierarchy(allocator, cell_size, sector_size, field) {
            Ok(arena) => arena,
            Err(e) => {
                log::warn!("[QuadTree] build failed: {}", e);
                return Err(e);
            }
        };

        self.cell_size = cell_size;
        self.sector_size = sector_size;
        self.total_width = (field.width() - 1) as f32 * cell_size;
        self.total_height = (field.height() - 1) as f32 * cell_size;
        self.nodes = Some(arena);

        self.attach_all();

        log::info!(
            "[QuadTree] built {:.0}x{:.0}: {} nodes, {} leaves, {} tris, heights {:.2}..{:.2}",
            self.total_width,
            self.total_height,
            self.node_count(),
            self.leaf_count(),
            self.triangle_count(),
            self.min_height(),
            self.max_height()
        );
        Ok(())
    }

    /// `create` с cell/sector из конфига
    pub fn create_with_config<D>(&mut self, allocator: &mut D, field: &HeightField) -> Result<(), TerrainError>
    where
        D: MeshAllocator<Mesh = G>,
    {
        self.create(allocator, self.cell_size, self.sector_size, field)
    }

    /// Выбросить иерархию и открепить все объекты
    fn discard(&mut self) {
        self.nodes = None;
        self.total_width = 0.0;
        self.total_height = 0.0;
        for placement in self.models.values_mut() {
            placement.node = None;
        }
        for slot in self.components.values_mut() {
            slot.node = None;
        }
    }

    /// Расселить по новой иерархии всех зарегистрированных
    fn attach_all(&mut self) {
        let Some(arena) = self.nodes.as_mut() else { return };
        let mode = self.interpolation;

        for (&id, slot) in self.components.iter_mut() {
            if !attach_component(arena, id, slot, mode) {
                log::warn!("[QuadTree] component {:?} is outside the terrain", id);
            }
        }
        for (&id, placement) in self.models.iter_mut() {
            if !attach_model(arena, id, placement, mode) {
                log::warn!("[QuadTree] model {:?} is outside the terrain", id);
            }
        }
    }

    // ============================================
    // Состояние
    // ============================================

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.nodes.is_some()
    }

    /// Мировой размер по X
    #[inline]
    pub fn width(&self) -> f32 {
        self.total_width
    }

    /// Мировой размер по Z
    #[inline]
    pub fn height(&self) -> f32 {
        self.total_height
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    pub fn min_height(&self) -> f32 {
        self.root_node().map_or(0.0, QuadTreeNode::min_height)
    }

    pub fn max_height(&self) -> f32 {
        self.root_node().map_or(0.0, QuadTreeNode::max_height)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.as_ref().map_or(0, NodeArena::len)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.as_ref().map_or(0, |arena| arena.leaves().count())
    }

    pub fn triangle_count(&self) -> usize {
        self.nodes
            .as_ref()
            .map_or(0, |arena| arena.leaves().map(|(_, node)| node.num_tris()).sum())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.nodes.as_ref().map(NodeArena::root)
    }

    fn root_node(&self) -> Option<&QuadTreeNode<G>> {
        let arena = self.nodes.as_ref()?;
        arena.get(arena.root())
    }

    pub fn node(&self, id: NodeId) -> Option<&QuadTreeNode<G>> {
        self.nodes.as_ref()?.get(id)
    }

    pub fn nodes(&self) -> Option<&NodeArena<G>> {
        self.nodes.as_ref()
    }

    /// Самый глубокий узел, содержащий (x, z)
    pub fn deepest_node_at(&self, x: f32, z: f32) -> Option<NodeId> {
        self.nodes.as_ref()?.find_owner(x, z)
    }

    #[inline]
    pub fn culling(&self) -> bool {
        self.culling
    }

    pub fn set_culling(&mut self, enabled: bool) {
        self.culling = enabled;
    }

    #[inline]
    pub fn interpolation(&self) -> HeightInterpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, mode: HeightInterpolation) {
        self.interpolation = mode;
    }

    // ============================================
    // Высота
    // ============================================

    /// Высота террейна в (x, z), OUT_OF_RANGE вне террейна
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        match &self.nodes {
            Some(arena) => arena.height_at(arena.root(), x, z, self.interpolation),
            None => OUT_OF_RANGE,
        }
    }

    pub fn try_height_at(&self, x: f32, z: f32) -> Option<f32> {
        let height = self.height_at(x, z);
        (height != OUT_OF_RANGE).then_some(height)
    }

    // ============================================
    // Модели
    // ============================================

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Поставить модель. Y == 0.0 - поставить на поверхность.
    /// None если террейн не построен или точка вне террейна.
    pub fn add_model(&mut self, asset: A, position: Vec3, scale: f32, rotation: Vec3) -> Option<ModelId> {
        let mode = self.interpolation;
        let arena = self.nodes.as_mut()?;

        let mut placement = ModelPlacement::new(asset, position, scale, rotation);
        let id = ModelId(self.next_id);
        if !attach_model(arena, id, &mut placement, mode) {
            log::warn!(
                "[QuadTree] model at ({:.1}, {:.1}) is outside the terrain",
                position.x,
                position.z
            );
            return None;
        }

        self.next_id();
        self.models.insert(id, placement);
        Some(id)
    }

    /// Переставить модель. false если модель не в узле после перестановки.
    /// На не построенном террейне ничего не меняет.
    pub fn update_model_position(&mut self, id: ModelId, position: Vec3) -> bool {
        let mode = self.interpolation;
        let Some(arena) = self.nodes.as_mut() else { return false };
        let Some(placement) = self.models.get_mut(&id) else { return false };

        detach_model(arena, id, placement);
        placement.position = position;

        let attached = attach_model(arena, id, placement, mode);
        log::debug!("[QuadTree] model {:?} moved to {:?} (node {:?})", id, position, placement.node);
        attached
    }

    pub fn remove_model(&mut self, id: ModelId) -> Option<A> {
        let mut placement = self.models.remove(&id)?;
        if let Some(arena) = self.nodes.as_mut() {
            detach_model(arena, id, &mut placement);
        }
        Some(placement.asset)
    }

    pub fn model(&self, id: ModelId) -> Option<&ModelPlacement<A>> {
        self.models.get(&id)
    }

    pub fn model_node(&self, id: ModelId) -> Option<NodeId> {
        self.models.get(&id)?.node
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Сколько объектов сейчас прикреплено к узлам
    pub fn object_count(&self) -> usize {
        self.nodes
            .as_ref()
            .map_or(0, |arena| arena.iter().map(|(_, node)| node.object_count()).sum())
    }

    // ============================================
    // Компоненты
    // ============================================

    /// Зарегистрировать компонент. Если террейн ещё не построен,
    /// компонент будет размещён при следующем `create`.
    pub fn add_component(&mut self, component: Box<dyn TerrainComponent<A>>) -> ComponentId {
        let mode = self.interpolation;
        let id = ComponentId(self.next_id());
        let mut slot = ComponentSlot { component, node: None };

        if let Some(arena) = self.nodes.as_mut() {
            if !attach_component(arena, id, &mut slot, mode) {
                log::warn!("[QuadTree] component {:?} is outside the terrain", id);
            }
        }

        self.components.insert(id, slot);
        id
    }

    pub fn remove_component(&mut self, id: ComponentId) -> Option<Box<dyn TerrainComponent<A>>> {
        let mut slot = self.components.remove(&id)?;
        if let Some(arena) = self.nodes.as_mut() {
            detach_component(arena, id, &mut slot);
        }
        Some(slot.component)
    }

    /// Сменить позицию компонента и переселить его.
    /// false если компонент не найден или не попал ни в один узел.
    /// На не построенном террейне ничего не меняет.
    pub fn move_component(&mut self, id: ComponentId, position: Vec3) -> bool {
        let mode = self.interpolation;
        let Some(arena) = self.nodes.as_mut() else { return false };
        let Some(slot) = self.components.get_mut(&id) else { return false };

        slot.component.set_position(position);
        rehome_component(arena, id, slot, mode)
    }

    pub fn component(&self, id: ComponentId) -> Option<&dyn TerrainComponent<A>> {
        self.components.get(&id).map(|slot| slot.component.as_ref())
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut (dyn TerrainComponent<A> + 'static)> {
        self.components.get_mut(&id).map(|slot| slot.component.as_mut())
    }

    pub fn component_node(&self, id: ComponentId) -> Option<NodeId> {
        self.components.get(&id)?.node
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    // ============================================
    // Кадр
    // ============================================

    /// Тик всех компонентов. Сдвинувшиеся переселяются.
    pub fn update(&mut self, dt: f32) {
        let mode = self.interpolation;
        for (&id, slot) in self.components.iter_mut() {
            let before = slot.component.position();
            slot.component.update(dt);

            if slot.component.position() == before {
                continue;
            }
            if let Some(arena) = self.nodes.as_mut() {
                rehome_component(arena, id, slot, mode);
            }
        }
    }

    /// Загрузить ресурсы всех зарегистрированных компонентов
    pub fn load_content(&mut self) {
        for slot in self.components.values_mut() {
            slot.component.load();
        }
        log::debug!("[QuadTree] loaded {} components", self.components.len());
    }

    /// Освободить ресурсы всех зарегистрированных компонентов
    pub fn unload_content(&mut self) {
        for slot in self.components.values_mut() {
            slot.component.unload();
        }
    }

    /// Нарисовать террейн, затем модели и компоненты видимых узлов
    pub fn draw<R>(&mut self, renderer: &mut R, frame: &FrameContext)
    where
        R: MeshRenderer<G> + ModelRenderer<A>,
    {
        if self.draw_terrain(renderer, frame) {
            self.draw_objects(renderer, frame);
        }
    }

    /// Проход по мешам. false если рисовать нечего.
    pub fn draw_terrain<R>(&mut self, renderer: &mut R, frame: &FrameContext) -> bool
    where
        R: MeshRenderer<G> + ?Sized,
    {
        let Some(arena) = self.nodes.as_mut() else { return false };
        let root = arena.root();
        arena.draw(root, renderer, &frame.view_projection, self.culling);
        true
    }

    /// Модели, затем компоненты узлов, нарисованных в последнем `draw_terrain`
    pub fn draw_objects<R>(&self, renderer: &mut R, frame: &FrameContext)
    where
        R: ModelRenderer<A>,
    {
        let Some(arena) = self.nodes.as_ref() else { return };
        let drawn = arena.drawn_nodes();

        for &node_id in &drawn {
            for model_id in arena.node(node_id).models() {
                if let Some(placement) = self.models.get(&model_id) {
                    renderer.draw_model(
                        &placement.asset,
                        placement.world_matrix(),
                        &frame.view,
                        &frame.projection,
                    );
                }
            }
        }

        for &node_id in &drawn {
            for component_id in arena.node(node_id).components() {
                if let Some(slot) = self.components.get(&component_id) {
                    slot.component.draw(&mut *renderer, frame);
                }
            }
        }
    }
}

impl<G, A> Default for QuadTree<G, A> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================
// Размещение в узлах
// ============================================

/// Спуститься от корня до самого глубокого узла, содержащего модель
fn attach_model<G, A>(
    arena: &mut NodeArena<G>,
    id: ModelId,
    placement: &mut ModelPlacement<A>,
    mode: HeightInterpolation,
) -> bool {
    let (x, z) = (placement.position.x, placement.position.z);
    let Some(owner) = arena.find_owner(x, z) else { return false };

    if placement.position.y == 0.0 {
        placement.position.y = arena.height_at(owner, x, z, mode);
    }
    arena.node_mut(owner).models.insert(id);
    placement.node = Some(owner);
    true
}

fn detach_model<G, A>(arena: &mut NodeArena<G>, id: ModelId, placement: &mut ModelPlacement<A>) {
    if let Some(owner) = placement.node.take() {
        arena.node_mut(owner).models.remove(&id);
    }
}

fn attach_component<G, A>(
    arena: &mut NodeArena<G>,
    id: ComponentId,
    slot: &mut ComponentSlot<A>,
    mode: HeightInterpolation,
) -> bool {
    let position = slot.component.position();
    let Some(owner) = arena.find_owner(position.x, position.z) else { return false };

    snap_component(arena, owner, slot, mode);
    arena.node_mut(owner).components.insert(id);
    slot.node = Some(owner);
    true
}

fn detach_component<G, A>(arena: &mut NodeArena<G>, id: ComponentId, slot: &mut ComponentSlot<A>) {
    if let Some(owner) = slot.node.take() {
        arena.node_mut(owner).components.remove(&id);
    }
}

/// Y == 0.0 - поставить компонент на поверхность узла `owner`
fn snap_component<G, A>(arena: &NodeArena<G>, owner: NodeId, slot: &mut ComponentSlot<A>, mode: HeightInterpolation) {
    let position = slot.component.position();
    if position.y == 0.0 {
        let y = arena.height_at(owner, position.x, position.z, mode);
        slot.component.set_position(Vec3::new(position.x, y, position.z));
    }
}

/// Лист, всё ещё содержащий компонент, остаётся его узлом.
/// Иначе - заново от корня.
fn rehome_component<G, A>(
    arena: &mut NodeArena<G>,
    id: ComponentId,
    slot: &mut ComponentSlot<A>,
    mode: HeightInterpolation,
) -> bool {
    let position = slot.component.position();
    if let Some(owner) = slot.node {
        let node = arena.node(owner);
        if node.is_leaf() && node.contains(position.x, position.z) {
            snap_component(arena, owner, slot, mode);
            return true;
        }
    }

    detach_component(arena, id, slot);
    let attached = attach_component(arena, id, slot, mode);
    log::debug!("[QuadTree] component {:?} re-homed to {:?}", id, slot.node);
    attached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::{CpuMesh, CpuMeshAllocator, DrawRecorder};
    use std::cell::Cell;
    use std::rc::Rc;
    use ultraviolet::Mat4;

    type Tree = QuadTree<CpuMesh, &'static str>;

    /// Компонент, который едет с постоянной скоростью
    struct Walker {
        position: Vec3,
        velocity: Vec3,
    }

    impl Walker {
        fn boxed(position: Vec3, velocity: Vec3) -> Box<dyn TerrainComponent<&'static str>> {
            Box::new(Walker { position, velocity })
        }
    }

    impl TerrainComponent<&'static str> for Walker {
        fn position(&self) -> Vec3 {
            self.position
        }

        fn set_position(&mut self, position: Vec3) {
            self.position = position;
        }

        fn update(&mut self, dt: f32) {
            self.position += self.velocity * dt;
        }

        fn draw(&self, renderer: &mut dyn ModelRenderer<&'static str>, frame: &FrameContext) {
            renderer.draw_model(
                &"walker",
                Mat4::from_translation(self.position),
                &frame.view,
                &frame.projection,
            );
        }
    }

    /// Компонент, который считает load/unload
    struct Lamp {
        position: Vec3,
        loaded: Rc<Cell<i32>>,
    }

    impl TerrainComponent<&'static str> for Lamp {
        fn position(&self) -> Vec3 {
            self.position
        }

        fn set_position(&mut self, position: Vec3) {
            self.position = position;
        }

        fn load(&mut self) {
            self.loaded.set(self.loaded.get() + 1);
        }

        fn unload(&mut self) {
            self.loaded.set(self.loaded.get() - 1);
        }
    }

    fn hills(x: usize, y: usize) -> f32 {
        ((x * 5 + y * 3) % 7) as f32
    }

    /// 17x17 сэмплов, ячейка 1.0, сектор 4 -> 16 листов 4x4
    fn built_tree() -> Tree {
        let field = HeightField::from_fn(17, 17, hills);
        let mut tree = Tree::new();
        tree.create(&mut CpuMeshAllocator::new(), 1.0, 4, &field).unwrap();
        tree
    }

    fn frame(eye: Vec3, target: Vec3) -> FrameContext {
        let view = Mat4::look_at(eye, target, Vec3::unit_y());
        let proj = ultraviolet::projection::perspective_wgpu_dx(60f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0);
        FrameContext::new(view, proj)
    }

    #[test]
    fn test_unbuilt_tree_degrades() {
        let mut tree = Tree::new();

        assert!(!tree.is_valid());
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.height_at(1.0, 1.0), OUT_OF_RANGE);
        assert_eq!(tree.try_height_at(1.0, 1.0), None);
        assert_eq!(tree.add_model("rock", Vec3::new(1.0, 0.0, 1.0), 1.0, Vec3::zero()), None);
        assert_eq!(tree.model_count(), 0);
        assert_eq!(tree.deepest_node_at(1.0, 1.0), None);

        let mut recorder = DrawRecorder::new();
        assert!(!tree.draw_terrain(&mut recorder, &FrameContext::default()));
        tree.draw(&mut recorder, &FrameContext::default());
        assert!(recorder.meshes.is_empty());
        assert!(recorder.models.is_empty());
    }

    #[test]
    fn test_create_three_by_three() {
        let field = HeightField::from_fn(3, 3, |x, y| (x + y) as f32);
        let mut tree = Tree::new();
        tree.create(&mut CpuMeshAllocator::new(), 10.0, 2, &field).unwrap();

        assert!(tree.is_valid());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.triangle_count(), 8);
        assert_eq!(tree.width(), 20.0);
        assert_eq!(tree.height(), 20.0);
        assert_eq!(tree.min_height(), 0.0);
        assert_eq!(tree.max_height(), 4.0);
    }

    #[test]
    fn test_create_with_config_uses_config_sizes() {
        let config = TerrainConfig { cell_size: 2.0, sector_size: 8, ..TerrainConfig::default() };
        let field = HeightField::from_fn(17, 9, |_, _| 1.0);
        let mut tree = Tree::with_config(&config);
        tree.create_with_config(&mut CpuMeshAllocator::new(), &field).unwrap();

        assert_eq!(tree.width(), 32.0);
        assert_eq!(tree.height(), 16.0);
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_height_sentinel_outside_extent() {
        let tree = built_tree();

        assert_eq!(tree.height_at(-0.5, 3.0), OUT_OF_RANGE);
        assert_eq!(tree.height_at(3.0, -0.5), OUT_OF_RANGE);
        assert_eq!(tree.height_at(16.0, 3.0), OUT_OF_RANGE);
        assert_eq!(tree.height_at(3.0, 16.0), OUT_OF_RANGE);

        for &(x, z) in &[(0.0, 0.0), (7.3, 2.2), (15.9, 15.9), (4.0, 12.0)] {
            let h = tree.try_height_at(x, z).unwrap();
            assert!(h >= tree.min_height() && h <= tree.max_height());
        }
    }

    #[test]
    fn test_deepest_node_owns_point() {
        let tree = built_tree();
        let arena = tree.nodes().unwrap();

        let mut z = 0.0;
        while z < 16.0 {
            let mut x = 0.0;
            while x < 16.0 {
                let id = tree.deepest_node_at(x, z).unwrap();
                let node = tree.node(id).unwrap();
                assert!(node.is_leaf());
                assert!(node.contains(x, z));

                // Все предки тоже содержат точку
                let mut parent = node.parent();
                while let Some(p) = parent {
                    let ancestor = arena.get(p).unwrap();
                    assert!(ancestor.contains(x, z));
                    parent = ancestor.parent();
                }
                x += 0.45;
            }
            z += 0.45;
        }

        assert_eq!(tree.deepest_node_at(16.0, 1.0), None);
    }

    #[test]
    fn test_shared_boundary_is_deterministic() {
        let mut tree = built_tree();

        // (4, 8) лежит на границе четырёх листов
        let first = tree.deepest_node_at(4.0, 8.0).unwrap();
        for _ in 0..10 {
            assert_eq!(tree.deepest_node_at(4.0, 8.0), Some(first));
        }
        let rect = *tree.node(first).unwrap().rect();
        assert_eq!((rect.start_x, rect.start_y), (4.0, 8.0));

        let id = tree.add_model("post", Vec3::new(4.0, 1.0, 8.0), 1.0, Vec3::zero()).unwrap();
        assert_eq!(tree.model_node(id), Some(first));
    }

    #[test]
    fn test_add_remove_round_trip() {
        let mut tree = built_tree();
        assert_eq!(tree.object_count(), 0);

        let id = tree
            .add_model("tree", Vec3::new(5.5, 0.0, 7.5), 2.0, Vec3::zero())
            .unwrap();
        let owner = tree.model_node(id).unwrap();

        assert_eq!(tree.model_count(), 1);
        assert_eq!(tree.object_count(), 1);
        assert!(tree.node(owner).unwrap().models().any(|m| m == id));
        assert!(tree.node(owner).unwrap().contains(5.5, 7.5));

        // Y == 0 -> поставлена на поверхность
        let placed = tree.model(id).unwrap();
        assert_eq!(placed.position().y, tree.height_at(5.5, 7.5));
        assert_eq!(placed.scale(), 2.0);

        assert_eq!(tree.remove_model(id), Some("tree"));
        assert_eq!(tree.model_count(), 0);
        assert_eq!(tree.object_count(), 0);
        assert_eq!(tree.node(owner).unwrap().object_count(), 0);
        assert_eq!(tree.remove_model(id), None);
    }

    #[test]
    fn test_add_model_outside_is_rejected() {
        let mut tree = built_tree();

        assert_eq!(tree.add_model("far", Vec3::new(40.0, 0.0, 2.0), 1.0, Vec3::zero()), None);
        assert_eq!(tree.add_model("edge", Vec3::new(16.0, 0.0, 2.0), 1.0, Vec3::zero()), None);
        assert_eq!(tree.model_count(), 0);
        assert_eq!(tree.object_count(), 0);
    }

    #[test]
    fn test_nonzero_y_is_kept() {
        let mut tree = built_tree();
        let id = tree.add_model("kite", Vec3::new(2.0, 30.0, 2.0), 1.0, Vec3::zero()).unwrap();
        assert_eq!(tree.model(id).unwrap().position().y, 30.0);
    }

    #[test]
    fn test_update_model_position_moves_between_nodes() {
        let mut tree = built_tree();
        let id = tree.add_model("cart", Vec3::new(1.0, 3.0, 1.0), 1.0, Vec3::zero()).unwrap();
        let old = tree.model_node(id).unwrap();

        assert!(tree.update_model_position(id, Vec3::new(14.0, 3.0, 14.0)));
        let new = tree.model_node(id).unwrap();
        assert_ne!(old, new);
        assert!(tree.node(new).unwrap().contains(14.0, 14.0));
        assert_eq!(tree.node(old).unwrap().object_count(), 0);
        assert_eq!(tree.object_count(), 1);

        // Вне террейна: откреплена, но зарегистрирована
        assert!(!tree.update_model_position(id, Vec3::new(-5.0, 3.0, 1.0)));
        assert_eq!(tree.model_node(id), None);
        assert_eq!(tree.model_count(), 1);
        assert_eq!(tree.object_count(), 0);
    }

    #[test]
    fn test_component_registered_before_create_is_placed() {
        let mut tree = Tree::new();
        let id = tree.add_component(Walker::boxed(Vec3::new(2.5, 0.0, 9.5), Vec3::zero()));

        assert_eq!(tree.component_count(), 1);
        assert_eq!(tree.component_node(id), None);

        let field = HeightField::from_fn(17, 17, hills);
        tree.create(&mut CpuMeshAllocator::new(), 1.0, 4, &field).unwrap();

        let owner = tree.component_node(id).unwrap();
        assert!(tree.node(owner).unwrap().contains(2.5, 9.5));
        assert!(tree.node(owner).unwrap().components().any(|c| c == id));

        // Y == 0 -> поставлен на поверхность при расселении
        let y = tree.component(id).unwrap().position().y;
        assert_eq!(y, tree.height_at(2.5, 9.5));
    }

    #[test]
    fn test_add_component_snaps_to_surface() {
        let field = HeightField::from_fn(17, 17, |_, _| 7.0);
        let mut tree = Tree::new();
        tree.create(&mut CpuMeshAllocator::new(), 1.0, 4, &field).unwrap();

        let grounded = tree.add_component(Walker::boxed(Vec3::new(3.5, 0.0, 3.5), Vec3::zero()));
        let flying = tree.add_component(Walker::boxed(Vec3::new(3.5, 20.0, 3.5), Vec3::zero()));

        assert_eq!(tree.component(grounded).unwrap().position(), Vec3::new(3.5, 7.0, 3.5));
        assert_eq!(tree.component(flying).unwrap().position().y, 20.0);

        // Перемещение с Y == 0 тоже ставит на поверхность
        assert!(tree.move_component(flying, Vec3::new(12.0, 0.0, 5.0)));
        assert_eq!(tree.component(flying).unwrap().position(), Vec3::new(12.0, 7.0, 5.0));
    }

    #[test]
    fn test_moves_on_unbuilt_tree_change_nothing() {
        let mut tree = built_tree();
        let model = tree.add_model("rock", Vec3::new(3.0, 2.0, 3.0), 1.0, Vec3::zero()).unwrap();
        let component = tree.add_component(Walker::boxed(Vec3::new(5.0, 4.0, 5.0), Vec3::zero()));

        let thin = HeightField::from_fn(8, 1, |_, _| 0.0);
        assert!(tree.create(&mut CpuMeshAllocator::new(), 1.0, 4, &thin).is_err());

        assert!(!tree.update_model_position(model, Vec3::new(9.0, 2.0, 9.0)));
        assert_eq!(tree.model(model).unwrap().position(), Vec3::new(3.0, 2.0, 3.0));

        assert!(!tree.move_component(component, Vec3::new(9.0, 4.0, 9.0)));
        assert_eq!(tree.component(component).unwrap().position(), Vec3::new(5.0, 4.0, 5.0));
    }

    #[test]
    fn test_load_and_unload_reach_every_component() {
        let loaded = Rc::new(Cell::new(0));
        let mut tree = Tree::new();
        for i in 0..3 {
            tree.add_component(Box::new(Lamp {
                position: Vec3::new(i as f32, 1.0, 1.0),
                loaded: Rc::clone(&loaded),
            }));
        }

        tree.load_content();
        assert_eq!(loaded.get(), 3);

        tree.unload_content();
        assert_eq!(loaded.get(), 0);
    }

    #[test]
    fn test_failed_create_detaches_objects() {
        let mut tree = built_tree();
        let model = tree.add_model("rock", Vec3::new(3.0, 1.0, 3.0), 1.0, Vec3::zero()).unwrap();
        let component = tree.add_component(Walker::boxed(Vec3::new(9.0, 0.0, 9.0), Vec3::zero()));

        let thin = HeightField::from_fn(1, 8, |_, _| 0.0);
        assert!(tree.create(&mut CpuMeshAllocator::new(), 1.0, 4, &thin).is_err());

        assert!(!tree.is_valid());
        assert_eq!(tree.model_node(model), None);
        assert_eq!(tree.component_node(component), None);
        assert_eq!(tree.model_count(), 1);
        assert_eq!(tree.component_count(), 1);

        // Повторная сборка возвращает объекты в узлы
        let field = HeightField::from_fn(17, 17, hills);
        tree.create(&mut CpuMeshAllocator::new(), 1.0, 4, &field).unwrap();
        assert!(tree.model_node(model).is_some());
        assert!(tree.component_node(component).is_some());
        assert_eq!(tree.object_count(), 2);
    }

    #[test]
    fn test_move_component_keeps_or_rehomes() {
        let mut tree = built_tree();
        let id = tree.add_component(Walker::boxed(Vec3::new(1.0, 0.0, 1.0), Vec3::zero()));
        let first = tree.component_node(id).unwrap();

        // Тот же лист
        assert!(tree.move_component(id, Vec3::new(2.0, 0.0, 3.0)));
        assert_eq!(tree.component_node(id), Some(first));

        // Соседний лист
        assert!(tree.move_component(id, Vec3::new(6.0, 0.0, 1.0)));
        let second = tree.component_node(id).unwrap();
        assert_ne!(first, second);
        assert_eq!(tree.node(first).unwrap().object_count(), 0);
        let position = tree.component(id).unwrap().position();
        assert_eq!((position.x, position.z), (6.0, 1.0));
        assert_eq!(position.y, tree.height_at(6.0, 1.0));

        assert!(!tree.move_component(id, Vec3::new(100.0, 0.0, 1.0)));
        assert_eq!(tree.component_node(id), None);

        assert!(tree.remove_component(id).is_some());
        assert!(tree.remove_component(id).is_none());
        assert_eq!(tree.component_count(), 0);
    }

    #[test]
    fn test_update_rehomes_moving_components() {
        let mut tree = built_tree();
        let mover = tree.add_component(Walker::boxed(Vec3::new(1.0, 0.0, 1.0), Vec3::new(10.0, 0.0, 0.0)));
        let idle = tree.add_component(Walker::boxed(Vec3::new(9.0, 0.0, 9.0), Vec3::zero()));
        let idle_node = tree.component_node(idle);
        let start = tree.component(mover).unwrap().position();

        tree.update(1.0);

        assert_eq!(tree.component(mover).unwrap().position(), Vec3::new(11.0, start.y, 1.0));
        let owner = tree.component_node(mover).unwrap();
        assert!(tree.node(owner).unwrap().contains(11.0, 1.0));
        assert_eq!(tree.component_node(idle), idle_node);
    }

    #[test]
    fn test_draw_culls_terrain_behind_camera() {
        let mut tree = built_tree();
        tree.add_model("rock", Vec3::new(8.0, 0.0, 8.0), 1.0, Vec3::zero()).unwrap();
        tree.add_component(Walker::boxed(Vec3::new(8.0, 0.0, 8.0), Vec3::zero()));

        let mut recorder = DrawRecorder::new();
        let looking_away = frame(Vec3::new(-50.0, 30.0, 8.0), Vec3::new(-200.0, 0.0, 8.0));
        tree.draw(&mut recorder, &looking_away);

        assert!(recorder.meshes.is_empty());
        assert!(recorder.models.is_empty());
        let root = tree.root().unwrap();
        assert!(!tree.node(root).unwrap().was_drawn());
    }

    #[test]
    fn test_draw_visible_terrain_and_objects() {
        let mut tree = built_tree();
        tree.add_model("rock", Vec3::new(8.0, 0.0, 8.0), 1.0, Vec3::zero()).unwrap();
        tree.add_component(Walker::boxed(Vec3::new(8.0, 0.0, 8.0), Vec3::zero()));

        let mut recorder = DrawRecorder::new();
        let overview = frame(Vec3::new(8.0, 40.0, -20.0), Vec3::new(8.0, 0.0, 8.0));
        tree.draw(&mut recorder, &overview);

        assert!(!recorder.meshes.is_empty());
        assert!(recorder.meshes.len() <= tree.leaf_count());
        assert!(recorder.models.iter().any(|d| d.asset == "rock"));
        assert!(recorder.models.iter().any(|d| d.asset == "walker"));

        // Модели рисуются раньше компонентов
        let rock = recorder.models.iter().position(|d| d.asset == "rock").unwrap();
        let walker = recorder.models.iter().position(|d| d.asset == "walker").unwrap();
        assert!(rock < walker);
    }

    #[test]
    fn test_disabled_culling_draws_every_leaf() {
        let mut tree = built_tree();
        tree.set_culling(false);

        let mut recorder = DrawRecorder::<&'static str>::new();
        let looking_away = frame(Vec3::new(-50.0, 30.0, 8.0), Vec3::new(-200.0, 0.0, 8.0));
        tree.draw(&mut recorder, &looking_away);

        assert_eq!(recorder.meshes.len(), tree.leaf_count());
        assert_eq!(recorder.triangles, tree.triangle_count());
        assert!(tree.nodes().unwrap().iter().all(|(_, node)| node.was_drawn()));
    }
}
