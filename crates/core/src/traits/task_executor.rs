//! 迁移执行器接口
//!
//! 调度器和重试协调器只依赖这个接口，不关心迁移如何完成。

use async_trait::async_trait;

use migrator_domain::MigrationTask;
use migrator_errors::MigratorResult;

/// 执行单个迁移任务
///
/// 实现必须把所有失败转换为 `Err` 返回，不能让错误以panic形式逃出边界。
#[async_trait]
pub trait MigrationExecutor: Send + Sync {
    async fn execute(&self, task: &MigrationTask) -> MigratorResult<()>;

    fn name(&self) -> &str;
}
