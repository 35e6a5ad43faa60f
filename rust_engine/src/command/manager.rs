//! 命令历史

use crate::skeleton::Skeleton;

use super::Command;

/// 线性撤销/重做历史
///
/// `command_id` 之后的命令可以重做，记录新命令时被丢弃。
#[derive(Debug, Default)]
pub struct CommandManager {
    commands: Vec<Box<dyn Command>>,
    command_id: usize,
}

impl CommandManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 执行命令并记录
    pub fn execute(&mut self, command: Box<dyn Command>, skeleton: &mut Skeleton) {
        command.redo(skeleton);
        self.push(command);
    }

    /// 记录已经生效的命令
    pub fn push(&mut self, command: Box<dyn Command>) {
        self.commands.truncate(self.command_id);
        self.commands.push(command);
        self.command_id = self.commands.len();
    }

    /// 清空历史
    pub fn clear_commands(&mut self) {
        self.commands.clear();
        self.command_id = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.command_id > 0
    }

    /// 撤销上一个命令，没有可撤销的命令时什么也不做
    pub fn undo(&mut self, skeleton: &mut Skeleton) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.command_id -= 1;
        self.commands[self.command_id].undo(skeleton);
        true
    }

    pub fn can_redo(&self) -> bool {
        self.command_id < self.commands.len()
    }

    /// 重做下一个命令
    pub fn redo(&mut self, skeleton: &mut Skeleton) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.commands[self.command_id].redo(skeleton);
        self.command_id += 1;
        true
    }

    /// 历史中的命令数（包括可重做的）
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
