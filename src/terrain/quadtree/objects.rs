// ============================================
// Objects - Модели и мобильные компоненты на террейне
// ============================================
// Узел хранит только id. Кэш "текущий узел" у записи
// меняет исключительно контейнер (QuadTree).

use ultraviolet::{Mat4, Vec3};

use crate::render::{FrameContext, ModelRenderer};
use super::node::NodeId;

/// Хэндл размещённой модели
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub(crate) u64);

/// Хэндл мобильного компонента
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u64);

/// Статичная модель, стоящая на террейне
#[derive(Debug, Clone)]
pub struct ModelPlacement<A> {
    pub(crate) asset: A,
    /// Y == 0.0 означает "ещё не поставлена": при вставке берётся высота террейна
    pub(crate) position: Vec3,
    pub(crate) scale: f32,
    /// Углы поворота вокруг X, Y, Z (радианы)
    pub(crate) rotation: Vec3,
    pub(crate) node: Option<NodeId>,
}

impl<A> ModelPlacement<A> {
    pub(crate) fn new(asset: A, position: Vec3, scale: f32, rotation: Vec3) -> Self {
        Self {
            asset,
            position,
            scale,
            rotation,
            node: None,
        }
    }

    pub fn asset(&self) -> &A {
        &self.asset
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    /// Узел, который сейчас хранит модель
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Мировая матрица: масштаб, поворот X, Z, Y, перенос
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_scale(self.scale)
    }
}

/// Объект, который обновляется каждый кадр (например игрок).
/// Сам себя между узлами не переносит: после изменения позиции
/// контейнер переселяет его (QuadTree::move_component / update).
pub trait TerrainComponent<A> {
    fn position(&self) -> Vec3;

    fn set_position(&mut self, position: Vec3);

    /// Загрузка ресурсов (QuadTree::load_content)
    fn load(&mut self) {}

    fn unload(&mut self) {}

    fn update(&mut self, _dt: f32) {}

    /// Вызывается только если узел компонента был нарисован в этом кадре
    fn draw(&self, _renderer: &mut dyn ModelRenderer<A>, _frame: &FrameContext) {}
}

/// Запись компонента в реестре контейнера
pub(crate) struct ComponentSlot<A> {
    pub component: Box<dyn TerrainComponent<A>>,
    pub node: Option<NodeId>,
}
