/// 应用常量定义

/// 会话令牌请求头
pub const AUTH_HEADER_NAME: &str = "Authorization";

/// 会话在 Redis 中的 key 前缀, 值为登录用户ID (由认证服务写入)
pub const SESSION_KEY_PREFIX: &str = "session:";

/// 会话滑动有效期(秒), 每次鉴权通过后续期
pub const SESSION_TTL_SECONDS: i64 = 1800;

/// 代理层级上限 (admin=1, 会员固定为5)
pub const MAX_AGENT_LEVEL: i32 = 5;

/// 会员固定层级
pub const MEMBER_LEVEL: i32 = 5;

/// 直属会员汇总行的层级标记
pub const LEVEL_TAG_DIRECT_MEMBERS: i32 = -1;

/// 下级代理汇总行的层级标记
pub const LEVEL_TAG_SUB_AGENTS: i32 = -2;
